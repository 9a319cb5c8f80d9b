// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// - 公网IP查询（geolocation）
/// - 指标名称与记录（metrics）
/// - CSV存储（storage）
pub mod geolocation;
pub mod metrics;
pub mod storage;
