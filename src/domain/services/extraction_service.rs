// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::weather::NOT_AVAILABLE;
use crate::engines::session::{BrowserSession, Element, Locator, Scope, SessionError};
use crate::infrastructure::metrics::SCRAPE_RETRIES;
use crate::utils::retry_policy::RetryPolicy;
use metrics::counter;
use tracing::{debug, warn};

/// 空气质量候选元素
pub const AIR_QUALITY_SELECTOR: &str = ".air-rules .air-active";

/// 提取失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentReason {
    /// 当前没有已加载的页面
    NoPage,
    /// 定位器无法解析
    InvalidLocator,
    /// 没有匹配的元素
    NotFound,
    /// 元素存在但文本为空
    Empty,
}

/// 文本提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(String),
    Absent(AbsentReason),
}

impl Extraction {
    /// 提取失败时返回调用方给定的默认值（原样返回，不做修剪）
    pub fn or_default_text(self, default: &str) -> String {
        match self {
            Extraction::Found(text) => text,
            Extraction::Absent(_) => default.to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    /// 当前结果缺失时尝试另一种提取方式
    pub fn or_else<F>(self, fallback: F) -> Extraction
    where
        F: FnOnce() -> Extraction,
    {
        match self {
            Extraction::Found(_) => self,
            Extraction::Absent(_) => fallback(),
        }
    }
}

fn non_empty(text: &str) -> Extraction {
    let text = text.trim();
    if text.is_empty() {
        Extraction::Absent(AbsentReason::Empty)
    } else {
        Extraction::Found(text.to_string())
    }
}

/// 读取已定位元素的文本
pub fn element_text(element: &Element) -> Extraction {
    non_empty(element.text())
}

/// 读取已定位元素的属性
pub fn element_attr(element: &Element, name: &str) -> Extraction {
    match element.attr(name) {
        Some(value) => non_empty(value),
        None => Extraction::Absent(AbsentReason::NotFound),
    }
}

/// 读取第 `index` 个匹配元素的文本
pub fn extract_nth_text(
    session: &BrowserSession,
    scope: Scope<'_>,
    locator: &Locator,
    index: usize,
) -> Extraction {
    let elements = match session.select(scope, locator) {
        Ok(elements) => elements,
        Err(SessionError::InvalidLocator(_)) => {
            return Extraction::Absent(AbsentReason::InvalidLocator)
        }
        Err(_) => return Extraction::Absent(AbsentReason::NoPage),
    };

    match elements.get(index) {
        None => Extraction::Absent(AbsentReason::NotFound),
        Some(element) => element_text(element),
    }
}

/// 读取第一个匹配元素的文本
pub fn extract_text(session: &BrowserSession, scope: Scope<'_>, locator: &Locator) -> Extraction {
    extract_nth_text(session, scope, locator, 0)
}

/// 安全读取文本
///
/// 元素不存在、页面未加载或定位器无效时返回 `default`，从不返回错误。
pub fn safely_get_text(
    session: &BrowserSession,
    scope: Scope<'_>,
    locator: &Locator,
    default: &str,
) -> String {
    match extract_text(session, scope, locator) {
        Extraction::Found(text) => text,
        Extraction::Absent(reason) => {
            debug!(%locator, ?reason, "text not extracted, using default");
            default.to_string()
        }
    }
}

/// 带重试的页面导航
///
/// 最多尝试 `policy.attempts()` 次，每次失败后按策略等待。
/// 不可重试的错误（例如404）立即返回。返回最后一次的错误。
pub async fn get_with_retry(
    session: &mut BrowserSession,
    url: &str,
    policy: &RetryPolicy,
) -> Result<(), SessionError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match session.navigate(url).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && policy.should_retry(attempt) => {
                warn!(url, attempt, error = %e, "page load failed, retrying");
                counter!(SCRAPE_RETRIES).increment(1);
                tokio::time::sleep(policy.calculate_backoff(attempt)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 获取空气质量
///
/// 打开 `url`，返回第 `index` 个 `.air-rules .air-active` 元素的文本，
/// 任何失败都返回 `N/A`。
pub async fn get_air_quality(
    session: &mut BrowserSession,
    url: &str,
    index: usize,
    policy: &RetryPolicy,
) -> String {
    if let Err(e) = get_with_retry(session, url, policy).await {
        warn!(url, error = %e, "air quality page unavailable");
        return NOT_AVAILABLE.to_string();
    }

    extract_nth_text(
        session,
        Scope::Page,
        &Locator::css(AIR_QUALITY_SELECTOR),
        index,
    )
    .or_default_text(NOT_AVAILABLE)
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
