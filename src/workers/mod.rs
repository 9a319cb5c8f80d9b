// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 驱动省份、区县和逐小时抓取的完整流程
pub mod crawl_worker;

pub use crawl_worker::CrawlWorker;
