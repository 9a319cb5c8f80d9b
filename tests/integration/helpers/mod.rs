// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Datelike, Days, NaiveDate};
use std::path::Path;
use wxcrawl::config::settings::{
    CrawlSettings, EngineKind, EngineSettings, IdentitySettings, OutputSettings, Settings,
    SourceSettings,
};
use wxcrawl::engines::memory_engine::MemoryEngine;

pub const BASE_URL: &str = "https://thoitiet.test";

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 19).unwrap()
}

/// 测试用配置：HTTP引擎、无等待重试、不查询公网IP、固定输出文件名
pub fn test_settings(base_url: &str, output_dir: &Path) -> Settings {
    Settings {
        source: SourceSettings {
            base_url: base_url.to_string(),
            hourly_suffix: "/theo-gio".to_string(),
            region: None,
            air_quality_index: 0,
        },
        crawl: CrawlSettings {
            max_attempts: 3,
            backoff_ms: 0,
            window_days: 3,
            max_slots_per_day: None,
            concurrency: 1,
            count_only: false,
        },
        engine: EngineSettings {
            kind: EngineKind::Http,
            timeout_secs: 5,
            remote_debugging_url: None,
        },
        output: OutputSettings {
            directory: output_dir.display().to_string(),
            file_name: Some("weather.csv".to_string()),
            write_bom: false,
        },
        identity: IdentitySettings {
            enabled: false,
            lookup_url: String::new(),
            timeout_secs: 1,
        },
    }
}

/// 测试站点中的一个省份
pub struct ProvinceFixture {
    pub name: String,
    pub slug: String,
    pub region: String,
    pub districts: Vec<(String, String)>,
}

impl ProvinceFixture {
    pub fn new(name: &str, slug: &str, districts: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
            region: "Miền Bắc".to_string(),
            districts: districts
                .iter()
                .map(|(n, s)| (n.to_string(), s.to_string()))
                .collect(),
        }
    }

    pub fn in_region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    pub fn url(&self, base: &str) -> String {
        format!("{}/{}", base, self.slug)
    }

    pub fn district_url(&self, base: &str, slug: &str) -> String {
        format!("{}/{}/{}", base, self.slug, slug)
    }
}

/// 首页：按区域分组的省份菜单
pub fn home_page(provinces: &[ProvinceFixture]) -> String {
    let mut regions: Vec<&str> = Vec::new();
    for p in provinces {
        if !regions.contains(&p.region.as_str()) {
            regions.push(&p.region);
        }
    }

    let blocks: String = regions
        .iter()
        .map(|region| {
            let links: String = provinces
                .iter()
                .filter(|p| p.region == *region)
                .map(|p| {
                    format!(
                        r#"<li><a href="/{}" title="{}">{}</a></li>"#,
                        p.slug, p.name, p.name
                    )
                })
                .collect();
            format!(
                r#"<div class="col-megamenu"><h6>{}</h6><ul class="mega-submenu">{}</ul></div>"#,
                region, links
            )
        })
        .collect();

    format!(
        r#"<html><body><nav><div class="dropdown-menu">{}</div></nav></body></html>"#,
        blocks
    )
}

/// 省份页面：相邻区县链接
pub fn province_page(province: &ProvinceFixture) -> String {
    let links: String = province
        .districts
        .iter()
        .map(|(name, slug)| format!(r#"<a href="/{}/{}">{}</a>"#, province.slug, slug, name))
        .collect();
    format!(
        r#"<html><body><div class="khu-vuc-lan-can">{}</div></body></html>"#,
        links
    )
}

/// 区县详情页：空气质量
pub fn detail_page(air_quality: &str) -> String {
    format!(
        r#"<html><body><div class="air-rules"><span class="air-active">{}</span></div></body></html>"#,
        air_quality
    )
}

fn slot(label: &str, hour: usize) -> String {
    format!(
        r#"<details class="weather-day">
  <summary class="summary-day"><span>{label}</span>
    <span class="summary-temperature-min">{min}°C</span>
    <span class="summary-temperature-max-value">{max}°C</span>
    <p class="summary-description-detail">Trời nhiều mây</p>
    <div class="summary-humidity"><span>Độ ẩm</span><span>80%</span></div>
    <div class="summary-speed"><span>Gió</span><span>10 km/giờ</span></div>
  </summary>
  <div class="weather-content-item"><h6>UV</h6><div><span class="op-8 fw-bold">4</span></div></div>
  <div class="weather-content-item"><h6>Tầm nhìn</h6><div><span>10 km</span></div></div>
  <div class="weather-content-item"><h6>Áp suất</h6><div><h3>1010 mb</h3></div></div>
</details>"#,
        label = label,
        min = 20 + hour % 5,
        max = 28 + hour % 5,
    )
}

/// 逐小时页面
///
/// 共 `days` 天、每天 `per_day` 个时段。第一天从 00:00 开始；之后每天的第一个
/// 时段标签为 `d/M`，其余为 `HH:00`。
pub fn hourly_page(base: NaiveDate, days: u64, per_day: usize) -> String {
    let mut slots = Vec::new();
    for day in 0..days {
        let date = base.checked_add_days(Days::new(day)).unwrap();
        for hour in 0..per_day {
            let label = if day > 0 && hour == 0 {
                format!("{}/{}", date.day(), date.month())
            } else {
                format!("{:02}:00", hour)
            };
            slots.push(slot(&label, hour));
        }
    }
    format!("<html><body><main>{}</main></body></html>", slots.join("\n"))
}

/// 把整个站点登记到内存引擎
///
/// 每个区县都有详情页和逐小时页面；逐小时页面比窗口多一天。
pub fn register_site(
    engine: &MemoryEngine,
    base: &str,
    provinces: &[ProvinceFixture],
    per_day: usize,
) {
    engine.insert_page(base, home_page(provinces));
    for province in provinces {
        engine.insert_page(province.url(base), province_page(province));
        for (_, slug) in &province.districts {
            let url = province.district_url(base, slug);
            engine.insert_page(&url, detail_page("Tốt"));
            engine.insert_page(
                format!("{}/theo-gio", url),
                hourly_page(base_date(), 4, per_day),
            );
        }
    }
}
