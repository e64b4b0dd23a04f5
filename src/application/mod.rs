// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 把输入读取、批量调度和结果写出串成一次完整运行
pub mod use_cases;
