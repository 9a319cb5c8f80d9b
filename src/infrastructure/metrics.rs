// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, describe_counter, gauge};

pub const PAGES_VISITED: &str = "wxcrawl_pages_visited_total";
pub const SCRAPE_RETRIES: &str = "wxcrawl_scrape_retries_total";
pub const SENTINEL_RECORDS: &str = "wxcrawl_sentinel_records_total";
pub const RECORDS_WRITTEN: &str = "wxcrawl_records_written";
pub const CRAWLS: &str = "wxcrawl_crawls_total";

/// 注册指标说明
///
/// 本crate不安装导出器；嵌入进程安装了recorder时这些描述才会生效。
pub fn describe_metrics() {
    describe_counter!(PAGES_VISITED, "Pages successfully loaded by browser sessions");
    describe_counter!(SCRAPE_RETRIES, "Page loads and hourly scrapes that were retried");
    describe_counter!(SENTINEL_RECORDS, "Districts that fell back to a placeholder record");
}

/// 记录一次爬取写出的行数
pub fn record_crawl(records: usize) {
    gauge!(RECORDS_WRITTEN).set(records as f64);
    counter!(CRAWLS).increment(1);
}
