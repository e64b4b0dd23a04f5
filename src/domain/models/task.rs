// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 账号标识
///
/// 从输入行归一化得到的账号句柄，不含前导 `@`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 查询任务
///
/// 把一个账号标识绑定到它在输入中的位置。任务创建后不可变，
/// 由且仅由一个 worker 消费一次，产生一个终态结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// 输入位置（从 0 开始，连续且唯一）
    pub index: usize,
    /// 要查询的账号
    pub identifier: Identifier,
}

impl Task {
    /// 按顺序为标识分配连续下标。重复的标识会得到各自独立的任务。
    pub fn batch(identifiers: impl IntoIterator<Item = Identifier>) -> Vec<Task> {
        identifiers
            .into_iter()
            .enumerate()
            .map(|(index, identifier)| Task { index, identifier })
            .collect()
    }
}
