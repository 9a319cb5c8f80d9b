// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 浏览器会话
//!
//! 在抓取引擎之上提供 navigate / select / 读取文本和属性 的能力。
//! 页面内容以HTML快照的形式保存，每次查询时重新解析，
//! 这样会话本身只持有 `String`，可以安全地跨 `.await` 使用。

use crate::engines::traits::{EngineError, ScrapeRequest, ScraperEngine};
use crate::infrastructure::metrics::PAGES_VISITED;
use metrics::counter;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 导航失败
    #[error("Navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: EngineError,
    },
    /// 当前没有已加载的页面
    #[error("No page loaded")]
    NoPage,
    /// 无法解析的选择器
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),
}

impl SessionError {
    /// 导航失败且引擎错误可重试时返回true
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Navigation { source, .. } => source.is_retryable(),
            SessionError::NoPage | SessionError::InvalidLocator(_) => false,
        }
    }
}

/// 元素定位方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS选择器
    Css(String),
    /// 标签定位：先找到文本包含 `caption` 的 `label` 元素，
    /// 再在其后续兄弟元素（匹配 `sibling`）中查找 `value`
    Labelled {
        label: String,
        caption: String,
        sibling: String,
        value: String,
    },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn labelled(
        label: impl Into<String>,
        caption: impl Into<String>,
        sibling: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Locator::Labelled {
            label: label.into(),
            caption: caption.into(),
            sibling: sibling.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "{}", s),
            Locator::Labelled {
                label,
                caption,
                sibling,
                value,
            } => write!(f, "{}[~'{}'] + {} {}", label, caption, sibling, value),
        }
    }
}

/// 元素快照
///
/// 定位时即保存元素的外部HTML、可见文本和属性，之后的读取不再依赖页面。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    html: String,
    text: String,
    attrs: HashMap<String, String>,
}

impl Element {
    fn snapshot(element: ElementRef<'_>) -> Self {
        let attrs = element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            html: element.html(),
            text: visible_text(element),
            attrs,
        }
    }

    /// 元素的可见文本（空白已规整）
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 读取属性
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }
}

/// 查询范围：整个页面或已定位的元素
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Page,
    Element(&'a Element),
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    html: String,
}

/// 浏览器会话
///
/// 一个会话一次只持有一个页面，整个遍历过程中按顺序复用。
pub struct BrowserSession {
    engine: Arc<dyn ScraperEngine>,
    timeout: Duration,
    page: Option<LoadedPage>,
    pages_visited: u64,
}

impl BrowserSession {
    pub fn new(engine: Arc<dyn ScraperEngine>, timeout: Duration) -> Self {
        Self {
            engine,
            timeout,
            page: None,
            pages_visited: 0,
        }
    }

    /// 导航到指定URL
    ///
    /// 失败时丢弃当前页面，后续的查询将返回 `SessionError::NoPage`。
    pub async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.page = None;
        let request = ScrapeRequest::new(url, self.timeout);
        let response = self
            .engine
            .scrape(&request)
            .await
            .map_err(|source| SessionError::Navigation {
                url: url.to_string(),
                source,
            })?;

        debug!(
            engine = self.engine.name(),
            url,
            elapsed_ms = response.response_time_ms,
            "page loaded"
        );
        self.pages_visited += 1;
        counter!(PAGES_VISITED).increment(1);
        self.page = Some(LoadedPage {
            url: response.final_url,
            html: response.content,
        });
        Ok(())
    }

    /// 当前页面的URL
    pub fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.url.as_str())
    }

    /// 本会话成功加载的页面数量
    pub fn pages_visited(&self) -> u64 {
        self.pages_visited
    }

    /// 在给定范围内查找所有匹配的元素
    pub fn select(
        &self,
        scope: Scope<'_>,
        locator: &Locator,
    ) -> Result<Vec<Element>, SessionError> {
        let html = match scope {
            Scope::Page => {
                let page = self.page.as_ref().ok_or(SessionError::NoPage)?;
                Html::parse_document(&page.html)
            }
            Scope::Element(element) => Html::parse_fragment(&element.html),
        };

        let root = match scope {
            Scope::Page => Some(html.root_element()),
            // the fragment parser wraps the snapshot in a synthetic <html>
            Scope::Element(_) => html.root_element().children().find_map(ElementRef::wrap),
        };
        let Some(root) = root else {
            return Ok(Vec::new());
        };

        match locator {
            Locator::Css(css) => {
                let selector = parse_selector(css)?;
                Ok(root.select(&selector).map(Element::snapshot).collect())
            }
            Locator::Labelled {
                label,
                caption,
                sibling,
                value,
            } => {
                let label_sel = parse_selector(label)?;
                let sibling_sel = parse_selector(sibling)?;
                let value_sel = parse_selector(value)?;

                let mut found = Vec::new();
                for label_el in root.select(&label_sel) {
                    if !visible_text(label_el).contains(caption.as_str()) {
                        continue;
                    }
                    for sib in label_el.next_siblings().filter_map(ElementRef::wrap) {
                        if sibling_sel.matches(&sib) {
                            found.extend(sib.select(&value_sel).map(Element::snapshot));
                        }
                    }
                }
                Ok(found)
            }
        }
    }

    /// 以当前页面URL为基准解析链接
    pub fn resolve_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        let resolved = match self.current_url().and_then(|u| url::Url::parse(u).ok()) {
            Some(base) => base.join(href).ok()?,
            None => url::Url::parse(href).ok()?,
        };
        Some(resolved.to_string().trim_end_matches('/').to_string())
    }
}

fn parse_selector(css: &str) -> Result<Selector, SessionError> {
    Selector::parse(css).map_err(|_| SessionError::InvalidLocator(css.to_string()))
}

fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
