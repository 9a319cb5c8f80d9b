// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::reading_service::SlotLayout;
use crate::utils::retry_policy::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据源配置
    pub source: SourceSettings,
    /// 爬取配置
    pub crawl: CrawlSettings,
    /// 引擎配置
    pub engine: EngineSettings,
    /// 输出配置
    pub output: OutputSettings,
    /// 公网IP查询配置
    pub identity: IdentitySettings,
}

/// 数据源配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// 网站首页
    pub base_url: String,
    /// 逐小时页面后缀
    pub hourly_suffix: String,
    /// 只爬取该区域的省份；为空表示全部
    pub region: Option<String>,
    /// 空气质量取第几个 `.air-active` 元素
    pub air_quality_index: usize,
}

impl SourceSettings {
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

/// 爬取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// 每个页面的最大尝试次数
    pub max_attempts: u32,
    /// 两次尝试之间的等待时间（毫秒）
    pub backoff_ms: u64,
    /// 保留的天数
    pub window_days: u32,
    /// 每天最多保留的时段数
    pub max_slots_per_day: Option<usize>,
    /// 同时处理的省份数量
    pub concurrency: usize,
    /// 只统计URL数量，不抓取数据
    pub count_only: bool,
}

impl CrawlSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }

    pub fn slot_layout(&self) -> SlotLayout {
        SlotLayout {
            window_days: self.window_days,
            max_slots_per_day: self.max_slots_per_day,
        }
    }
}

/// 抓取引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 无头Chromium
    Chromium,
    /// 纯HTTP请求
    Http,
}

/// 引擎配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub kind: EngineKind,
    /// 单个页面的超时时间（秒）
    pub timeout_secs: u64,
    /// 远程Chrome调试地址
    pub remote_debugging_url: Option<String>,
}

impl EngineSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// 输出目录
    pub directory: String,
    /// 固定文件名；未设置时按 `yyyy-MM-dd_HH-mm_<行数>.csv` 生成
    pub file_name: Option<String>,
    /// 是否写入UTF-8 BOM
    pub write_bom: bool,
}

/// 公网IP查询配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    pub enabled: bool,
    pub lookup_url: String,
    pub timeout_secs: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `WXCRAWL__` 前缀的环境变量，后者覆盖前者。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("WXCRAWL").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("source.base_url", "https://thoitiet.vn")?
            .set_default("source.hourly_suffix", "/theo-gio")?
            .set_default("source.air_quality_index", 0)?
            .set_default("crawl.max_attempts", 3)?
            .set_default("crawl.backoff_ms", 10_000)?
            .set_default("crawl.window_days", 3)?
            .set_default("crawl.concurrency", 1)?
            .set_default("crawl.count_only", false)?
            .set_default("engine.kind", "chromium")?
            .set_default("engine.timeout_secs", 60)?
            .set_default("output.directory", "data")?
            .set_default("output.write_bom", false)?
            .set_default("identity.enabled", true)?
            .set_default("identity.lookup_url", "https://checkip.amazonaws.com")?
            .set_default("identity.timeout_secs", 5)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
