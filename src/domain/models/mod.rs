// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 地区（location）：省份和区县
/// - 天气（weather）：逐小时天气记录及其进度标记
pub mod location;
pub mod weather;
