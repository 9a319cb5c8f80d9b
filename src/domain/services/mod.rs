// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 提取服务（extraction_service）：安全读取文本、带重试的导航、空气质量
/// - 列表服务（listing_service）：省份和区县枚举
/// - 逐小时服务（reading_service）：单个区县数天的逐小时记录
/// - 重试服务（retry_service）：重试状态机与占位记录
pub mod extraction_service;
pub mod listing_service;
pub mod reading_service;
pub mod retry_service;
