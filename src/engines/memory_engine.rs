// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, ScrapeRequest, ScrapeResponse, ScraperEngine};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// 内存引擎
///
/// 从预先登记的页面表中返回HTML，并记录每个URL被请求的次数。
/// 用于离线回放和测试。未登记的URL返回404，标记为失败的URL返回503。
#[derive(Default)]
pub struct MemoryEngine {
    pages: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记页面
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert_page(url, html);
        self
    }

    pub fn insert_page(&self, url: impl Into<String>, html: impl Into<String>) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(url.into(), html.into());
        }
    }

    /// 让某个URL始终返回503
    pub fn fail_url(&self, url: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(url.into());
        }
    }

    /// 某个URL被请求的次数
    pub fn calls(&self, url: &str) -> u32 {
        self.calls
            .lock()
            .map(|calls| calls.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ScraperEngine for MemoryEngine {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, EngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(request.url.clone()).or_insert(0) += 1;
        }

        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(&request.url))
            .unwrap_or(false);
        if failing {
            return Err(EngineError::Status(503));
        }

        let page = self
            .pages
            .lock()
            .map_err(|e| EngineError::Other(e.to_string()))?
            .get(&request.url)
            .cloned();

        match page {
            Some(content) => Ok(ScrapeResponse {
                status_code: 200,
                final_url: request.url.clone(),
                content,
                response_time_ms: 0,
            }),
            None => Err(EngineError::Status(404)),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
