// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, ScrapeRequest, ScrapeResponse, ScraperEngine};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

/// Playwright引擎
///
/// 基于chromiumoxide实现的无头浏览器引擎。浏览器实例在第一次抓取时启动，
/// 之后所有请求复用同一个实例，每个请求使用独立的标签页。
pub struct PlaywrightEngine {
    browser: OnceCell<Browser>,
    remote_debugging_url: Option<String>,
}

impl Default for PlaywrightEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PlaywrightEngine {
    /// 创建新的浏览器引擎
    ///
    /// # 参数
    ///
    /// * `remote_debugging_url` - 远程Chrome调试地址；为None时在本地启动无头Chrome
    pub fn new(remote_debugging_url: Option<String>) -> Self {
        Self {
            browser: OnceCell::new(),
            remote_debugging_url,
        }
    }

    // Launches (or connects to) Chrome once; later calls reuse the instance.
    async fn browser(&self) -> Result<&Browser, EngineError> {
        self.browser
            .get_or_try_init(|| async {
                let remote = self
                    .remote_debugging_url
                    .clone()
                    .or_else(|| std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok());

                let (browser, mut handler) = if let Some(ref url) = remote {
                    tracing::info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url).await.map_err(|e| {
                        EngineError::Browser(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let config = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(30))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage")
                        .arg("--disable-extensions")
                        .arg("--disable-popup-blocking")
                        .arg("--blink-settings=imagesEnabled=false")
                        .build()
                        .map_err(EngineError::Browser)?;

                    Browser::launch(config)
                        .await
                        .map_err(|e| EngineError::Browser(e.to_string()))?
                };

                tokio::spawn(async move {
                    while let Some(h) = handler.next().await {
                        if h.is_err() {
                            break;
                        }
                    }
                });

                Ok(browser)
            })
            .await
    }
}

// Runs `work` under `limit`, then always runs `close`, also after a timeout.
async fn bounded_then_close<T, W, C, F>(
    limit: Duration,
    work: W,
    close: C,
) -> Result<T, EngineError>
where
    W: Future<Output = Result<T, EngineError>>,
    C: FnOnce() -> F,
    F: Future<Output = ()>,
{
    let outcome = tokio::time::timeout(limit, work).await;
    close().await;
    outcome.map_err(|_| EngineError::Timeout)?
}

#[async_trait]
impl ScraperEngine for PlaywrightEngine {
    /// 打开新标签页，导航到目标URL并返回渲染后的HTML
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, EngineError> {
        let start = Instant::now();

        let browser = tokio::time::timeout(request.timeout, self.browser())
            .await
            .map_err(|_| EngineError::Timeout)??;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        let tab = page.clone();
        let content = bounded_then_close(
            request.timeout,
            async {
                // goto waits for the load event
                page.goto(&request.url)
                    .await
                    .map_err(|e| EngineError::Browser(e.to_string()))?;
                page.content()
                    .await
                    .map_err(|e| EngineError::Browser(e.to_string()))
            },
            || async move {
                if let Err(e) = tab.close().await {
                    tracing::debug!("Failed to close tab for {}: {}", request.url, e);
                }
            },
        )
        .await?;

        Ok(ScrapeResponse {
            status_code: 200,
            final_url: request.url.clone(),
            content,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "playwright"
    }
}
