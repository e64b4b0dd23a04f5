// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供查询 worker 和批量调度器
/// 包括任务分发、失败隔离和按输入顺序汇总结果
pub mod lookup_worker;
pub mod orchestrator;

pub use orchestrator::{Orchestrator, RunSummary};
