// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Identifier;
use crate::utils::errors::InputError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::warn;

// `<host>/@<handle>` with the handle ending at the next `/`, `?` or `#`
static PROFILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s/])[^/\s]+/@([^/?#\s]+)")
        .expect("profile url pattern is valid")
});

/// 把一行输入归一化为账号句柄
///
/// 匹配 `<host>/@<handle>` 时取 `@` 之后到下一个 `/`、`?` 或 `#` 之间的部分，
/// 否则取去掉首尾空白和前导 `@` 的整行。
pub fn identifier_from_line(line: &str) -> Identifier {
    let line = line.trim();
    if let Some(handle) = PROFILE_URL.captures(line).and_then(|c| c.get(1)) {
        return Identifier::new(handle.as_str());
    }
    Identifier::new(line.trim_start_matches('@'))
}

/// 归一化整段输入文本
///
/// 跳过空行，保持顺序，不去重。
pub fn normalize(raw: &str) -> Vec<Identifier> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(line_no, line)| {
            let identifier = identifier_from_line(line);
            if identifier.is_empty() {
                warn!(line = line_no + 1, raw = line, "Skipping line without a handle");
                return None;
            }
            Some(identifier)
        })
        .collect()
}

/// 读取输入文件并归一化
pub async fn read_identifiers(path: &Path) -> Result<Vec<Identifier>, InputError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| InputError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    let text = String::from_utf8(bytes).map_err(|_| InputError::Malformed {
        path: path.to_path_buf(),
    })?;
    Ok(normalize(&text))
}
