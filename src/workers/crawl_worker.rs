// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::location::ProvinceInfo;
use crate::domain::models::weather::HourlyWeatherInfo;
use crate::domain::services::extraction_service::get_air_quality;
use crate::domain::services::listing_service::{get_all_provinces, get_districts_of_province};
use crate::domain::services::reading_service::ScrapeTarget;
use crate::domain::services::retry_service::scrape_with_retry;
use crate::engines::session::BrowserSession;
use crate::engines::traits::ScraperEngine;
use crate::infrastructure::geolocation::lookup_public_ip;
use crate::infrastructure::metrics::record_crawl;
use crate::infrastructure::storage::{output_path, save_to_csv, CsvOptions};
use crate::utils::errors::CrawlError;
use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// 一次爬取中累积的记录
///
/// 由爬取工作器独占，按省份、区县的遍历顺序追加。
#[derive(Debug, Default)]
pub struct RecordCollection {
    records: Vec<HourlyWeatherInfo>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = HourlyWeatherInfo>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 占位记录数量
    pub fn sentinel_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_sentinel()).count()
    }

    pub fn as_slice(&self) -> &[HourlyWeatherInfo] {
        &self.records
    }

    pub fn into_vec(self) -> Vec<HourlyWeatherInfo> {
        self.records
    }
}

/// URL统计（只统计模式）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlCensus {
    pub provinces: usize,
    pub districts: usize,
    /// 空气质量页面数量（每个省份和区县各一个）
    pub air_quality_urls: usize,
    /// 去重后的省份与区县URL数量
    pub unique_urls: usize,
    /// `unique_urls + air_quality_urls`
    pub total_urls: usize,
}

/// 爬取报告
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub provinces: usize,
    pub districts: usize,
    pub records: usize,
    pub sentinels: usize,
    pub pages_visited: u64,
    /// 写出的CSV文件；只统计模式下为None
    pub output: Option<PathBuf>,
    pub census: Option<UrlCensus>,
    pub public_ip: Option<String>,
    pub elapsed: Duration,
}

struct ProvinceOutcome {
    records: Vec<HourlyWeatherInfo>,
    districts: usize,
}

/// 爬取工作器
///
/// 省份 → 区县 → 逐小时记录，最后一次性写入CSV。
pub struct CrawlWorker {
    engine: Arc<dyn ScraperEngine>,
    settings: Settings,
    base_date: Option<NaiveDate>,
}

impl CrawlWorker {
    /// 创建新的爬取工作器
    pub fn new(engine: Arc<dyn ScraperEngine>, settings: Settings) -> Self {
        Self {
            engine,
            settings,
            base_date: None,
        }
    }

    /// 固定第一个时段的日期；默认为本地今天
    pub fn with_base_date(mut self, base_date: NaiveDate) -> Self {
        self.base_date = Some(base_date);
        self
    }

    fn new_session(&self) -> BrowserSession {
        BrowserSession::new(self.engine.clone(), self.settings.engine.timeout())
    }

    /// 运行一次完整的爬取
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlReport)` - 爬取完成（区县级失败已转为占位记录）
    /// * `Err(CrawlError)` - CSV写入失败
    pub async fn run(&self) -> Result<CrawlReport, CrawlError> {
        let started = Instant::now();
        let source = &self.settings.source;
        let policy = self.settings.crawl.retry_policy();

        let public_ip = if self.settings.identity.enabled {
            let ip = lookup_public_ip(
                &self.settings.identity.lookup_url,
                Duration::from_secs(self.settings.identity.timeout_secs),
            )
            .await;
            info!("Crawling from public IP {}", ip);
            Some(ip)
        } else {
            None
        };

        let mut session = self.new_session();
        let provinces = get_all_provinces(
            &mut session,
            &source.base_url,
            source.region(),
            &source.hourly_suffix,
            &policy,
        )
        .await;
        if provinces.is_empty() {
            warn!(url = %source.base_url, "no provinces found");
        }

        if self.settings.crawl.count_only {
            let census = self.census(&mut session, &provinces).await;
            return Ok(CrawlReport {
                provinces: census.provinces,
                districts: census.districts,
                records: 0,
                sentinels: 0,
                pages_visited: session.pages_visited(),
                output: None,
                census: Some(census),
                public_ip,
                elapsed: started.elapsed(),
            });
        }

        let visited = AtomicU64::new(session.pages_visited());
        let concurrency = self.settings.crawl.concurrency.max(1);
        let outcomes: Vec<ProvinceOutcome> = if concurrency == 1 {
            let mut outcomes = Vec::with_capacity(provinces.len());
            for province in &provinces {
                outcomes.push(self.crawl_province(&mut session, province, &visited).await);
            }
            outcomes
        } else {
            let visited = &visited;
            stream::iter(provinces.iter())
                .map(|province| async move {
                    let mut session = self.new_session();
                    self.crawl_province(&mut session, province, visited).await
                })
                .buffered(concurrency)
                .collect()
                .await
        };

        let mut collection = RecordCollection::new();
        let mut districts = 0;
        for outcome in outcomes {
            districts += outcome.districts;
            collection.extend(outcome.records);
        }

        let output = &self.settings.output;
        let path = output_path(
            Path::new(&output.directory),
            output.file_name.as_deref(),
            Local::now().naive_local(),
            collection.len(),
        );
        save_to_csv(
            collection.as_slice(),
            &path,
            &CsvOptions {
                write_bom: output.write_bom,
            },
        )
        .await?;
        record_crawl(collection.len());

        let report = CrawlReport {
            provinces: provinces.len(),
            districts,
            records: collection.len(),
            sentinels: collection.sentinel_count(),
            pages_visited: visited.load(Ordering::Relaxed),
            output: Some(path),
            census: None,
            public_ip,
            elapsed: started.elapsed(),
        };
        info!(
            rows = report.records,
            sentinels = report.sentinels,
            pages_visited = report.pages_visited,
            "Success save to {}",
            report.output.as_deref().unwrap_or(Path::new("")).display()
        );
        info!("Total runtime: {} ms", report.elapsed.as_millis());
        Ok(report)
    }

    #[instrument(skip(self, session, province, visited), fields(province = %province.name))]
    async fn crawl_province(
        &self,
        session: &mut BrowserSession,
        province: &ProvinceInfo,
        visited: &AtomicU64,
    ) -> ProvinceOutcome {
        let source = &self.settings.source;
        let policy = self.settings.crawl.retry_policy();
        let layout = self.settings.crawl.slot_layout();
        let base_date = self
            .base_date
            .unwrap_or_else(|| Local::now().date_naive());

        let mut last_seen = session.pages_visited();
        let districts =
            get_districts_of_province(session, &province.url, &source.hourly_suffix, &policy).await;
        if districts.is_empty() {
            warn!(url = %province.url, "province has no districts");
        }

        let mut records = Vec::new();
        for district in &districts {
            let air_quality =
                get_air_quality(session, &district.url, source.air_quality_index, &policy).await;
            let target = ScrapeTarget {
                province: province.name.clone(),
                district: district.name.clone(),
                url_hour: district.url_hour.clone(),
                air_quality,
            };
            let scraped = scrape_with_retry(session, &target, &policy, base_date, &layout).await;

            let delta = session.pages_visited() - last_seen;
            let total = visited.fetch_add(delta, Ordering::Relaxed) + delta;
            last_seen += delta;
            info!(
                district = %district.name,
                rows = scraped.len(),
                pages_visited = total,
                "district finished"
            );
            records.extend(scraped);
        }

        let remaining = session.pages_visited() - last_seen;
        visited.fetch_add(remaining, Ordering::Relaxed);

        ProvinceOutcome {
            records,
            districts: districts.len(),
        }
    }

    async fn census(&self, session: &mut BrowserSession, provinces: &[ProvinceInfo]) -> UrlCensus {
        let source = &self.settings.source;
        let policy = self.settings.crawl.retry_policy();
        let mut unique = HashSet::new();
        let mut census = UrlCensus::default();

        for province in provinces {
            census.provinces += 1;
            census.air_quality_urls += 1;
            unique.insert(province.url.clone());

            let districts =
                get_districts_of_province(session, &province.url, &source.hourly_suffix, &policy)
                    .await;
            for district in districts {
                census.districts += 1;
                census.air_quality_urls += 1;
                unique.insert(district.url);
            }
        }

        census.unique_urls = unique.len();
        census.total_urls = census.unique_urls + census.air_quality_urls;
        info!(
            provinces = census.provinces,
            districts = census.districts,
            air_quality_urls = census.air_quality_urls,
            total_urls = census.total_urls,
            "URL census finished"
        );
        census
    }
}
