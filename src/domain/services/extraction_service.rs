// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::outcome::LookupError;
use crate::domain::models::profile::{
    Avatar, Bio, ProfileDetails, ProfileHeader, ProfileRecord, Stats,
};
use crate::domain::models::task::Identifier;
use crate::engines::traits::{Session, SessionError};

/// 查询页面上的元素 id
pub mod fields {
    pub const USERNAME_INPUT: &str = "username-input";
    pub const SEARCH_BUTTON: &str = "search-button";
    pub const RESULTS_CARD: &str = "results-card";

    pub const NICKNAME: &str = "nickname";
    pub const USERNAME: &str = "username";
    pub const PROFILE_LINK: &str = "profile-link";
    pub const AVATAR: &str = "avatar";
    pub const DOWNLOAD_AVATAR_LINK: &str = "download-avatar-link";
    pub const ABOUT: &str = "about";
    pub const BIO_LINK: &str = "bio-link";
    pub const USER_ID: &str = "user-id";
    pub const COUNTRY: &str = "country";
    pub const LANGUAGE: &str = "language";
    pub const CREATED_DATE: &str = "created-date";
    pub const NICKNAME_MODIFIED: &str = "nickname-modified";
    pub const USERNAME_MODIFIED: &str = "username-modified";
    pub const FOLLOWERS: &str = "followers";
    pub const FOLLOWING: &str = "following";
    pub const HEARTS: &str = "hearts";
    pub const VIDEOS: &str = "videos";
    pub const FRIENDS: &str = "friends";
}

/// 没有简介链接时写入的值
pub const NO_BIO_LINK: &str = "N/A";

/// 归一化简介链接
///
/// 空值、纯空白、服务的占位锚点（或裸 `#`）改写为 `"N/A"`，其余原样保留。
pub fn normalize_bio_link(href: &str, placeholder: &str) -> String {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed == "#" || trimmed == placeholder.trim() {
        NO_BIO_LINK.to_string()
    } else {
        href.to_string()
    }
}

fn extraction_error(field: &str, err: SessionError) -> LookupError {
    LookupError::Extraction {
        field: field.to_string(),
        message: err.to_string(),
    }
}

async fn text(session: &dyn Session, field: &str) -> Result<String, LookupError> {
    session
        .read_text(field)
        .await
        .map(|value| value.trim().to_string())
        .map_err(|e| extraction_error(field, e))
}

async fn attr(session: &dyn Session, field: &str, name: &str) -> Result<String, LookupError> {
    session
        .read_attribute(field, name)
        .await
        .map_err(|e| extraction_error(field, e))
}

/// 提取服务
///
/// 按固定字段集读取结果页。任一字段缺失时整条记录作废。
pub struct ExtractionService {
    placeholder_bio_link: String,
}

impl ExtractionService {
    pub fn new(placeholder_bio_link: impl Into<String>) -> Self {
        Self {
            placeholder_bio_link: placeholder_bio_link.into(),
        }
    }

    /// 读取完整的资料记录
    pub async fn extract(
        &self,
        session: &dyn Session,
        identifier: &Identifier,
    ) -> Result<ProfileRecord, LookupError> {
        use fields::*;

        let profile_header = ProfileHeader {
            nickname: text(session, NICKNAME).await?,
            username: text(session, USERNAME).await?,
            profile_link: attr(session, PROFILE_LINK, "href").await?,
        };
        let avatar = Avatar {
            avatar_src: attr(session, AVATAR, "src").await?,
            download_avatar_link: attr(session, DOWNLOAD_AVATAR_LINK, "href").await?,
        };
        let bio = Bio {
            about: text(session, ABOUT).await?,
            bio_link: normalize_bio_link(
                &attr(session, BIO_LINK, "href").await?,
                &self.placeholder_bio_link,
            ),
        };
        let profile_details = ProfileDetails {
            user_id: text(session, USER_ID).await?,
            country: text(session, COUNTRY).await?,
            language: text(session, LANGUAGE).await?,
            account_created: text(session, CREATED_DATE).await?,
            nickname_modified: text(session, NICKNAME_MODIFIED).await?,
            username_modified: text(session, USERNAME_MODIFIED).await?,
        };
        let stats = Stats {
            followers: text(session, FOLLOWERS).await?,
            following: text(session, FOLLOWING).await?,
            hearts: text(session, HEARTS).await?,
            videos: text(session, VIDEOS).await?,
            friends: text(session, FRIENDS).await?,
        };

        Ok(ProfileRecord {
            input_identifier: identifier.clone(),
            profile_header,
            avatar,
            bio,
            profile_details,
            stats,
            error: None,
        })
    }
}
