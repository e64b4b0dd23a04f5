// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::models::outcome::Outcome;
use crate::domain::models::profile::ProfileRecord;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 结果文件写入器
///
/// 把按输入顺序排列的结果写成缩进的 JSON 数组，非 ASCII 字符原样保留
pub struct JsonResultWriter {
    path: PathBuf,
    include_failures: bool,
}

impl JsonResultWriter {
    pub fn new(path: impl Into<PathBuf>, include_failures: bool) -> Self {
        Self {
            path: path.into(),
            include_failures,
        }
    }

    /// 要写入的记录
    pub fn records(&self, outcomes: &[Outcome]) -> Vec<ProfileRecord> {
        outcomes
            .iter()
            .filter_map(|o| o.to_record(self.include_failures))
            .collect()
    }

    pub fn render(&self, outcomes: &[Outcome]) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(&self.records(outcomes))?)
    }

    /// 写入结果文件，覆盖已有文件
    pub async fn write(&self, outcomes: &[Outcome]) -> Result<(), StorageError> {
        let body = self.render(outcomes)?;

        // 确保目录存在
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&self.path).await?;
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
