// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::weather::HourlyWeatherInfo;
use crate::domain::services::reading_service::{
    scrape_hourly_weather_3days, ScrapeTarget, SlotLayout,
};
use crate::engines::session::BrowserSession;
use crate::infrastructure::metrics::{SCRAPE_RETRIES, SENTINEL_RECORDS};
use crate::utils::retry_policy::RetryPolicy;
use chrono::NaiveDate;
use metrics::counter;
use tracing::{error, warn};

/// 单个区县的重试状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Pending,
    /// 正在进行第n次尝试（从1开始）
    Attempting(u32),
    Succeeded,
    /// 所有尝试均失败，输出占位记录
    FailedSentinel,
}

impl RetryState {
    /// 根据本次尝试结果推进状态；终止状态不再变化
    pub fn advance(self, succeeded: bool, max_attempts: u32) -> RetryState {
        match self {
            RetryState::Pending => RetryState::Attempting(1),
            RetryState::Attempting(_) if succeeded => RetryState::Succeeded,
            RetryState::Attempting(n) if n < max_attempts.max(1) => RetryState::Attempting(n + 1),
            RetryState::Attempting(_) => RetryState::FailedSentinel,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Succeeded | RetryState::FailedSentinel)
    }
}

/// 带重试的逐小时抓取
///
/// 最多尝试 `policy.attempts()` 次，两次尝试之间按策略等待。全部失败后返回
/// 恰好一条占位记录，因此结果永远不为空，也不会向上传播错误。
pub async fn scrape_with_retry(
    session: &mut BrowserSession,
    target: &ScrapeTarget,
    policy: &RetryPolicy,
    base_date: NaiveDate,
    layout: &SlotLayout,
) -> Vec<HourlyWeatherInfo> {
    let max_attempts = policy.attempts();
    let mut state = RetryState::Pending.advance(false, max_attempts);
    let mut stage = "navigate";
    let mut records = Vec::new();

    while let RetryState::Attempting(attempt) = state {
        match scrape_hourly_weather_3days(session, target, base_date, layout).await {
            Ok(scraped) => {
                records = scraped;
                state = state.advance(true, max_attempts);
            }
            Err(e) => {
                stage = e.stage();
                state = state.advance(false, max_attempts);
                if !state.is_terminal() {
                    warn!(
                        url = %target.url_hour,
                        attempt,
                        max_attempts,
                        error = %e,
                        "hourly scrape failed, retrying"
                    );
                    counter!(SCRAPE_RETRIES).increment(1);
                    tokio::time::sleep(policy.calculate_backoff(attempt)).await;
                } else {
                    error!(
                        url = %target.url_hour,
                        attempts = max_attempts,
                        error = %e,
                        "hourly scrape gave up"
                    );
                }
            }
        }
    }

    if state == RetryState::Succeeded {
        return records;
    }

    counter!(SENTINEL_RECORDS).increment(1);
    vec![HourlyWeatherInfo::sentinel(
        &target.province,
        &target.district,
        &target.url_hour,
        &base_date.format("%Y-%m-%d").to_string(),
        stage,
    )]
}

#[cfg(test)]
#[path = "retry_service_test.rs"]
mod tests;
