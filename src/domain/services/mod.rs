// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 输入归一化（input_normalizer）：把输入行转换为有序的账号标识
/// - 查询服务（lookup_service）：驱动单次查询的状态机
/// - 提取服务（extraction_service）：按固定字段集读取结果页
pub mod extraction_service;
pub mod input_normalizer;
pub mod lookup_service;
