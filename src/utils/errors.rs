// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;
use thiserror::Error;

/// 输入错误类型
///
/// 输入文件无法读取或内容不合法，属于致命错误，在任何任务开始前终止运行
#[derive(Error, Debug)]
pub enum InputError {
    #[error("无法读取输入文件 {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("输入文件 {path} 不是有效的 UTF-8 文本")]
    Malformed { path: PathBuf },
}

/// 运行错误类型
///
/// 只包含会终止整批运行的错误；单个任务的失败由 `LookupError` 表示
#[derive(Error, Debug)]
pub enum RunError {
    #[error("输入错误: {0}")]
    Input(#[from] InputError),

    #[error("并发数必须为正整数，当前为 {0}")]
    InvalidConcurrency(usize),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("写入输出文件 {path} 失败: {message}")]
    Output { path: PathBuf, message: String },
}

/// 持久日志写入错误
///
/// 非致命：发生后持久日志被关闭，运行继续只写控制台
#[derive(Error, Debug)]
#[error("日志文件写入失败: {0}")]
pub struct LogWriteError(#[from] pub std::io::Error);

/// 从 panic 负载中取出可读消息
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}
