// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, ScrapeRequest, ScrapeResponse, ScraperEngine};
use async_trait::async_trait;
use std::time::Instant;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; wxcrawl/0.1)";

/// HTTP抓取引擎
///
/// 基于reqwest实现，不执行JavaScript。适用于服务端渲染的页面。
pub struct ReqwestEngine {
    client: reqwest::Client,
}

impl Default for ReqwestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestEngine {
    /// 创建新的HTTP抓取引擎
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ScraperEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeResponse)` - 抓取响应
    /// * `Err(EngineError)` - 网络错误或非2xx状态码
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, EngineError> {
        let start = Instant::now();
        let response = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(EngineError::Status(status_code));
        }
        let final_url = response.url().to_string();
        let content = response.text().await?;

        Ok(ScrapeResponse {
            status_code,
            final_url,
            content,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
