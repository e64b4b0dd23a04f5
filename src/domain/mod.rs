// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：任务、资料记录和终态结果
/// - 服务（services）：输入归一化、查询状态机和字段提取
///
/// 领域层只依赖 `engines::traits` 中的会话抽象，不依赖具体的自动化引擎。
pub mod models;
pub mod services;
