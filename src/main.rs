// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::{error, info};
use wxcrawl::config::settings::{EngineKind, EngineSettings, Settings};
use wxcrawl::engines::playwright_engine::PlaywrightEngine;
use wxcrawl::engines::reqwest_engine::ReqwestEngine;
use wxcrawl::engines::traits::ScraperEngine;
use wxcrawl::infrastructure::metrics::describe_metrics;
use wxcrawl::utils::telemetry;
use wxcrawl::workers::CrawlWorker;

fn create_engine(settings: &EngineSettings) -> Arc<dyn ScraperEngine> {
    match settings.kind {
        EngineKind::Chromium => Arc::new(PlaywrightEngine::new(
            settings.remote_debugging_url.clone(),
        )),
        EngineKind::Http => Arc::new(ReqwestEngine::new()),
    }
}

// Switches the console code page so Vietnamese names print correctly.
#[cfg(windows)]
fn force_utf8_console() {
    if let Err(e) = std::process::Command::new("cmd")
        .args(["/C", "chcp", "65001"])
        .stdout(std::process::Stdio::null())
        .status()
    {
        tracing::warn!("Failed to switch console to UTF-8: {}", e);
    }
}

#[cfg(not(windows))]
fn force_utf8_console() {}

/// 主函数
///
/// 初始化日志和配置，执行一次完整爬取（或URL统计）后退出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    force_utf8_console();
    info!("Starting wxcrawl...");
    describe_metrics();

    // 2. Load configuration
    let settings = Settings::new()?;
    info!(
        base_url = %settings.source.base_url,
        region = settings.source.region().unwrap_or("all"),
        engine = ?settings.engine.kind,
        "Configuration loaded"
    );

    // 3. Run the crawl
    let engine = create_engine(&settings.engine);
    let worker = CrawlWorker::new(engine, settings);
    let report = match worker.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    match (&report.census, &report.output) {
        (Some(census), _) => info!(
            provinces = census.provinces,
            districts = census.districts,
            air_quality_urls = census.air_quality_urls,
            total_urls = census.total_urls,
            "URL census complete"
        ),
        (None, Some(path)) => info!(
            provinces = report.provinces,
            districts = report.districts,
            rows = report.records,
            sentinels = report.sentinels,
            "Weather data written to {}",
            path.display()
        ),
        (None, None) => {}
    }

    Ok(())
}
