// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::session::SessionError;
use thiserror::Error;

/// 单个区县逐小时数据抓取错误
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 页面无法加载
    #[error("Failed to load {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: SessionError,
    },

    /// 页面已加载但没有任何时段
    #[error("No hourly slots found on {url}")]
    NoSlots { url: String },
}

impl ScrapeError {
    /// 失败所处阶段，写入占位记录的 stopPoint
    pub fn stage(&self) -> &'static str {
        match self {
            ScrapeError::Navigation { .. } => "navigate",
            ScrapeError::NoSlots { .. } => "slots",
        }
    }
}

/// CSV读写错误
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("第{line}行格式错误: {reason}")]
    Malformed { line: usize, reason: String },
}

/// 爬取流程错误
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("CSV写入失败: {0}")]
    Csv(#[from] CsvError),
}
