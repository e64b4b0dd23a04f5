// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use thiserror::Error;

/// 会话错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 无法启动或连接自动化引擎
    #[error("Launch failed: {0}")]
    Launch(String),
    /// 页面导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 元素不存在
    #[error("Element not found: #{0}")]
    ElementNotFound(String),
    /// 与引擎的连接已断开
    #[error("Session disconnected: {0}")]
    Disconnected(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl SessionError {
    /// 元素暂未渲染，轮询时视为“尚未就绪”而不是失败
    pub fn is_not_ready(&self) -> bool {
        matches!(self, SessionError::ElementNotFound(_))
    }
}

/// 一次查询独占的自动化会话
///
/// 元素一律按 id 定位。会话不在任务之间共享。
#[async_trait]
pub trait Session: Send + Sync {
    /// 导航到指定地址并等待页面加载
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// 清空输入框后输入文本
    async fn locate_and_fill(&self, field_id: &str, text: &str) -> Result<(), SessionError>;

    /// 点击元素
    async fn click(&self, field_id: &str) -> Result<(), SessionError>;

    /// 元素存在且可见时返回 true，元素不存在时返回 false
    async fn is_visible(&self, field_id: &str) -> Result<bool, SessionError>;

    /// 读取元素的可见文本（已去除首尾空白）
    async fn read_text(&self, field_id: &str) -> Result<String, SessionError>;

    /// 读取元素属性，属性缺失时返回空字符串
    async fn read_attribute(&self, field_id: &str, name: &str) -> Result<String, SessionError>;

    /// 释放会话，消费自身保证只释放一次
    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// 会话工厂
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// 打开一个新会话
    async fn open(&self) -> Result<Box<dyn Session>, SessionError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
