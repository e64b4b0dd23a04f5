// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含一次完整运行的用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体和服务
pub mod domain;

/// 引擎模块
///
/// 定义自动化会话抽象及其浏览器实现
pub mod engines;

/// 基础设施模块
///
/// 提供结果文件存储
pub mod infrastructure;

/// 队列模块
///
/// 实现任务队列
pub mod queue;

/// 工具模块
///
/// 提供错误类型、运行日志和诊断日志
pub mod utils;

/// 工作器模块
///
/// 实现查询 worker 和批量调度
pub mod workers;
