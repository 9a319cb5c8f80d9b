// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::weather::{remove_units, HourlyWeatherInfo, StopPoint, NOT_AVAILABLE};
use crate::domain::services::extraction_service::{extract_text, safely_get_text, Extraction};
use crate::engines::session::{BrowserSession, Locator, Scope};
use crate::utils::errors::ScrapeError;
use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

const SLOT_SELECTOR: &str = "details.weather-day";
const SLOT_LABEL: &str = ".summary-day span";

static DAY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").unwrap());
static TIME_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})").unwrap());

/// 单个区县的抓取目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub province: String,
    pub district: String,
    /// 逐小时页面URL
    pub url_hour: String,
    /// 已获取的空气质量，原样写入每条记录
    pub air_quality: String,
}

/// 时段窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    /// 保留的天数（从基准日期开始）
    pub window_days: u32,
    /// 每天最多保留的时段数，None表示不限制
    pub max_slots_per_day: Option<usize>,
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            window_days: 3,
            max_slots_per_day: None,
        }
    }
}

/// 时段标签
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotLabel {
    /// `d/M`，新的一天
    Day { day: u32, month: u32 },
    /// `HH:MM`
    Time(String),
    Unknown,
}

fn parse_label(label: &str) -> SlotLabel {
    if label.contains('/') {
        return match DAY_LABEL.captures(label) {
            Some(caps) => SlotLabel::Day {
                day: caps[1].parse().unwrap_or(0),
                month: caps[2].parse().unwrap_or(0),
            },
            None => SlotLabel::Day { day: 0, month: 0 },
        };
    }
    match TIME_LABEL.captures(label) {
        Some(caps) => {
            let hour: u32 = caps[1].parse().unwrap_or(0);
            SlotLabel::Time(format!("{:02}:{}", hour, &caps[2]))
        }
        None => SlotLabel::Unknown,
    }
}

/// 时段的时间值
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotTime {
    /// 从标签中解析出的 `HH:MM`
    Parsed(String),
    /// 无法解析的非空标签，原样保留
    Raw(String),
    /// 标签缺失
    Missing,
}

impl SlotTime {
    // Only parsed times identify a slot; raw and missing labels never collide.
    fn key(&self) -> Option<&str> {
        match self {
            SlotTime::Parsed(time) => Some(time),
            _ => None,
        }
    }

    fn into_value(self) -> String {
        match self {
            SlotTime::Parsed(time) | SlotTime::Raw(time) => time,
            SlotTime::Missing => NOT_AVAILABLE.to_string(),
        }
    }
}

fn add_days(date: NaiveDate, days: usize) -> NaiveDate {
    date.checked_add_days(Days::new(days as u64)).unwrap_or(date)
}

// The year closest to `reference`; handles December to January in both directions.
fn nearest_date(reference: NaiveDate, day: u32, month: u32) -> Option<NaiveDate> {
    let year = reference.year();
    [year - 1, year, year + 1]
        .into_iter()
        .filter_map(|y| NaiveDate::from_ymd_opt(y, month, day))
        .min_by_key(|candidate| (*candidate - reference).num_days().abs())
}

/// 计算页面上每一天的日期
///
/// `markers[i]` 为第i天的 `d/M` 标签（没有标签或无法解析时为None）。
/// 第一个可解析的标签决定窗口起点，之前的天依次向前推；没有任何标签时从 `base_date` 开始。
/// 之后每一天默认为前一天加一，带标签时取离该日期最近的年份。
fn day_dates(base_date: NaiveDate, markers: &[Option<(u32, u32)>]) -> Vec<NaiveDate> {
    let anchor = markers.iter().enumerate().find_map(|(i, marker)| {
        let (day, month) = (*marker)?;
        nearest_date(add_days(base_date, i), day, month).map(|date| (i, date))
    });
    let start = match anchor {
        Some((i, date)) => date.checked_sub_days(Days::new(i as u64)).unwrap_or(date),
        None => base_date,
    };

    let mut dates: Vec<NaiveDate> = Vec::with_capacity(markers.len());
    for marker in markers {
        let date = match dates.last() {
            None => start,
            Some(previous) => {
                let expected = add_days(*previous, 1);
                marker
                    .and_then(|(day, month)| nearest_date(expected, day, month))
                    .unwrap_or(expected)
            }
        };
        dates.push(date);
    }
    dates
}

/// 每个时段读取的字段：(CSV列名, 定位器)
fn slot_fields() -> Vec<(&'static str, Locator)> {
    vec![
        ("temperatureMax", Locator::css(".summary-temperature-max-value")),
        ("temperatureMin", Locator::css(".summary-temperature-min")),
        ("humidity", Locator::css(".summary-humidity > span:last-child")),
        ("pressure", Locator::labelled("h6", "Áp suất", "div", "h3")),
        ("visibility", Locator::labelled("h6", "Tầm nhìn", "div", "span")),
        ("uvIndex", Locator::css(".weather-content-item .op-8.fw-bold")),
        ("windSpeed", Locator::css(".summary-speed > span:last-child")),
        ("description", Locator::css(".summary-description-detail")),
    ]
}

/// 抓取一个区县未来数天的逐小时天气
///
/// # 参数
///
/// * `session` - 浏览器会话
/// * `target` - 区县及其逐小时页面
/// * `base_date` - 参考日期（通常为今天）；页面上的 `d/M` 标签优先
/// * `layout` - 时段窗口
///
/// # 返回值
///
/// * `Ok(Vec<HourlyWeatherInfo>)` - 按页面顺序排列的记录，至少一条
/// * `Err(ScrapeError)` - 页面无法加载或没有任何时段
#[instrument(
    skip(session, target, layout),
    fields(province = %target.province, district = %target.district)
)]
pub async fn scrape_hourly_weather_3days(
    session: &mut BrowserSession,
    target: &ScrapeTarget,
    base_date: NaiveDate,
    layout: &SlotLayout,
) -> Result<Vec<HourlyWeatherInfo>, ScrapeError> {
    session
        .navigate(&target.url_hour)
        .await
        .map_err(|source| ScrapeError::Navigation {
            url: target.url_hour.clone(),
            source,
        })?;

    let slots = session
        .select(Scope::Page, &Locator::css(SLOT_SELECTOR))
        .unwrap_or_default();
    if slots.is_empty() {
        return Err(ScrapeError::NoSlots {
            url: target.url_hour.clone(),
        });
    }

    // First pass: day index and time of every slot, in page order.
    let label_locator = Locator::css(SLOT_LABEL);
    let mut markers: Vec<Option<(u32, u32)>> = vec![None];
    let mut positions = Vec::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate() {
        let label = safely_get_text(session, Scope::Element(slot), &label_locator, "");
        let time = match parse_label(&label) {
            SlotLabel::Day { day, month } => {
                if i > 0 {
                    markers.push(None);
                }
                if let Some(last) = markers.last_mut() {
                    *last = Some((day, month));
                }
                SlotTime::Parsed("00:00".to_string())
            }
            SlotLabel::Time(time) => SlotTime::Parsed(time),
            SlotLabel::Unknown if !label.is_empty() => SlotTime::Raw(label),
            SlotLabel::Unknown => SlotTime::Missing,
        };
        positions.push((markers.len() - 1, time));
    }

    let dates = day_dates(base_date, &markers);
    let window = layout.window_days.max(1) as usize;
    let fields = slot_fields();

    let mut per_day: HashMap<usize, usize> = HashMap::new();
    let mut seen: HashSet<(usize, String)> = HashSet::new();
    let mut records = Vec::with_capacity(slots.len());

    for (slot, (day, time)) in slots.iter().zip(positions) {
        let date = dates[day];
        if day >= window {
            debug!(date = %date, "slot outside window");
            continue;
        }
        let count = per_day.entry(day).or_insert(0);
        if layout.max_slots_per_day.is_some_and(|max| *count >= max) {
            continue;
        }
        if let Some(key) = time.key() {
            if !seen.insert((day, key.to_string())) {
                debug!(date = %date, time = key, "duplicate slot skipped");
                continue;
            }
        }
        *count += 1;

        let mut defaulted = Vec::new();
        if time == SlotTime::Missing {
            defaulted.push("time".to_string());
        }

        let mut values: HashMap<&'static str, String> = HashMap::with_capacity(fields.len());
        for (name, locator) in &fields {
            let value = match extract_text(session, Scope::Element(slot), locator) {
                Extraction::Found(text) => remove_units(&text),
                Extraction::Absent(_) => {
                    defaulted.push(name.to_string());
                    NOT_AVAILABLE.to_string()
                }
            };
            values.insert(*name, value);
        }
        let mut take =
            |name: &str| values.remove(name).unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let record = HourlyWeatherInfo {
            province: target.province.clone(),
            district: target.district.clone(),
            date: date.format("%Y-%m-%d").to_string(),
            time: time.into_value(),
            temperature_max: take("temperatureMax"),
            temperature_min: take("temperatureMin"),
            humidity: take("humidity"),
            pressure: take("pressure"),
            visibility: take("visibility"),
            uv_index: take("uvIndex"),
            wind_speed: take("windSpeed"),
            air_quality: target.air_quality.clone(),
            description: take("description"),
            url: target.url_hour.clone(),
            stop_point: StopPoint::from_defaulted(defaulted),
        };
        records.push(record);
    }

    if records.is_empty() {
        return Err(ScrapeError::NoSlots {
            url: target.url_hour.clone(),
        });
    }

    debug!(count = records.len(), "hourly slots scraped");
    Ok(records)
}

#[cfg(test)]
#[path = "reading_service_test.rs"]
mod tests;
