// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：省份、区县和逐小时天气记录
/// - 服务（services）：遍历和提取逻辑
pub mod models;
pub mod services;
