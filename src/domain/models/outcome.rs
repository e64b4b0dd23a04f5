// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::ProfileRecord;
use crate::domain::models::task::Identifier;
use std::time::Duration;
use thiserror::Error;

/// 单个查询任务的失败原因
///
/// 只影响所属任务，不会中断同批的其他任务
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// 自动化会话无法打开
    #[error("session could not be opened: {0}")]
    SessionOpen(String),

    /// 首页或查询输入框在初始加载超时内不可用
    #[error("lookup page unreachable: {0}")]
    Unreachable(String),

    /// 结果在轮询预算内没有出现
    #[error("no results after {}s", .elapsed.as_secs())]
    PollTimeout { elapsed: Duration },

    /// 读取字段时元素缺失，部分记录被丢弃
    #[error("failed to read `{field}`: {message}")]
    Extraction { field: String, message: String },

    /// 运行被取消
    #[error("cancelled")]
    Cancelled,

    /// 查询过程异常终止（panic 或 worker 退出）
    #[error("aborted: {0}")]
    Aborted(String),
}

impl LookupError {
    /// 简短的失败类别
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::SessionOpen(_) => "session_open",
            LookupError::Unreachable(_) => "unreachable",
            LookupError::PollTimeout { .. } => "timeout",
            LookupError::Extraction { .. } => "extraction",
            LookupError::Cancelled => "cancelled",
            LookupError::Aborted(_) => "aborted",
        }
    }
}

/// 任务终态结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(ProfileRecord),
    Failure {
        reason: LookupError,
        identifier: Identifier,
    },
}

impl Outcome {
    pub fn failure(identifier: Identifier, reason: LookupError) -> Self {
        Outcome::Failure { reason, identifier }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn identifier(&self) -> &Identifier {
        match self {
            Outcome::Success(record) => &record.input_identifier,
            Outcome::Failure { identifier, .. } => identifier,
        }
    }

    /// 输出文件中的记录；失败任务在 `include_failures` 为真时写入占位记录
    pub fn to_record(&self, include_failures: bool) -> Option<ProfileRecord> {
        match self {
            Outcome::Success(record) => Some(record.clone()),
            Outcome::Failure { reason, identifier } if include_failures => Some(
                ProfileRecord::failed(identifier.clone(), format!("{}: {}", reason.kind(), reason)),
            ),
            Outcome::Failure { .. } => None,
        }
    }
}
