// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 任务（task）：账号标识及其输入位置
/// - 资料记录（profile）：一次成功查询的结构化结果
/// - 结果（outcome）：任务的终态，成功或带原因的失败
pub mod outcome;
pub mod profile;
pub mod task;

pub use outcome::{LookupError, Outcome};
pub use profile::ProfileRecord;
pub use task::{Identifier, Task};
