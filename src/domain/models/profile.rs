// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Identifier;
use serde::{Deserialize, Serialize};

/// 账号资料记录
///
/// 一次成功查询的结构化结果。所有叶子字段都按页面原文保存为字符串，
/// 数值解析（千分位、k/m 后缀）留给下游工具。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// 输入中的账号标识
    pub input_identifier: Identifier,
    pub profile_header: ProfileHeader,
    pub avatar: Avatar,
    pub bio: Bio,
    pub profile_details: ProfileDetails,
    pub stats: Stats,
    /// 查询失败原因，仅出现在失败占位记录中
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileHeader {
    pub nickname: String,
    pub username: String,
    pub profile_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub avatar_src: String,
    pub download_avatar_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bio {
    pub about: String,
    pub bio_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub user_id: String,
    pub country: String,
    pub language: String,
    pub account_created: String,
    pub nickname_modified: String,
    pub username_modified: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub followers: String,
    pub following: String,
    pub hearts: String,
    pub videos: String,
    pub friends: String,
}

impl ProfileRecord {
    /// 所有字段为空字符串的记录
    pub fn empty(input_identifier: Identifier) -> Self {
        Self {
            input_identifier,
            profile_header: ProfileHeader::default(),
            avatar: Avatar::default(),
            bio: Bio::default(),
            profile_details: ProfileDetails::default(),
            stats: Stats::default(),
            error: None,
        }
    }

    /// 失败任务在输出中的占位记录，保持输出位置与输入位置一一对应
    pub fn failed(input_identifier: Identifier, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::empty(input_identifier)
        }
    }
}
