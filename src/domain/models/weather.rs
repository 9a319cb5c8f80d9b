// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 缺失值占位符
pub const NOT_AVAILABLE: &str = "N/A";

/// CSV列顺序
pub const CSV_HEADER: [&str; 15] = [
    "province",
    "district",
    "date",
    "time",
    "temperatureMax",
    "temperatureMin",
    "humidity",
    "pressure",
    "visibility",
    "uvIndex",
    "windSpeed",
    "airQuality",
    "description",
    "url",
    "stopPoint",
];

// " km/giờ" must be stripped before " km"
const UNITS: [&str; 5] = ["°C", "%", " km/giờ", " km", " mb"];

/// 去掉数值中的单位并去除首尾空白
pub fn remove_units(value: &str) -> String {
    let mut cleaned = value.to_string();
    for unit in UNITS {
        cleaned = cleaned.replace(unit, "");
    }
    cleaned.trim().to_string()
}

/// 抓取进度标记
///
/// 序列化形式：`OK`、`PARTIAL:humidity|pressure`、`FAILED:navigate@Hà Nội/Ba Đình`。
/// 地名中的 `%`、`@`、`/` 写作 `%25`、`%40`、`%2F`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopPoint {
    /// 所有字段均已读取
    Ok,
    /// 记录已生成，但列出的字段使用了默认值
    Partial(Vec<String>),
    /// 占位记录
    Failed {
        stage: String,
        province: String,
        district: String,
    },
}

impl StopPoint {
    pub fn from_defaulted(fields: Vec<String>) -> Self {
        if fields.is_empty() {
            StopPoint::Ok
        } else {
            StopPoint::Partial(fields)
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StopPoint::Failed { .. })
    }
}

fn escape_place(name: &str) -> String {
    name.replace('%', "%25")
        .replace('@', "%40")
        .replace('/', "%2F")
}

fn unescape_place(name: &str) -> String {
    name.replace("%2F", "/")
        .replace("%40", "@")
        .replace("%25", "%")
}

impl fmt::Display for StopPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopPoint::Ok => write!(f, "OK"),
            StopPoint::Partial(fields) => write!(f, "PARTIAL:{}", fields.join("|")),
            StopPoint::Failed {
                stage,
                province,
                district,
            } => write!(
                f,
                "FAILED:{}@{}/{}",
                stage,
                escape_place(province),
                escape_place(district)
            ),
        }
    }
}

impl FromStr for StopPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "OK" {
            return Ok(StopPoint::Ok);
        }
        if let Some(rest) = s.strip_prefix("PARTIAL:") {
            return Ok(StopPoint::Partial(
                rest.split('|').map(|f| f.to_string()).collect(),
            ));
        }
        if let Some(rest) = s.strip_prefix("FAILED:") {
            let (stage, location) = rest
                .split_once('@')
                .ok_or_else(|| format!("missing location in stop point `{}`", s))?;
            let (province, district) = location
                .split_once('/')
                .ok_or_else(|| format!("missing district in stop point `{}`", s))?;
            return Ok(StopPoint::Failed {
                stage: stage.to_string(),
                province: unescape_place(province),
                district: unescape_place(district),
            });
        }
        Err(format!("unknown stop point `{}`", s))
    }
}

/// 逐小时天气记录
///
/// 观测字段均为已去掉单位的展示字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyWeatherInfo {
    pub province: String,
    pub district: String,
    /// 日期，`yyyy-MM-dd`
    pub date: String,
    /// 时间，`HH:MM`
    pub time: String,
    pub temperature_max: String,
    pub temperature_min: String,
    pub humidity: String,
    pub pressure: String,
    pub visibility: String,
    pub uv_index: String,
    pub wind_speed: String,
    pub air_quality: String,
    pub description: String,
    pub url: String,
    pub stop_point: StopPoint,
}

impl HourlyWeatherInfo {
    /// 创建占位记录
    ///
    /// 区县在所有尝试后仍然失败时使用，所有观测字段均为 `N/A`。
    pub fn sentinel(
        province: &str,
        district: &str,
        url: &str,
        date: &str,
        stage: &str,
    ) -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            province: province.to_string(),
            district: district.to_string(),
            date: date.to_string(),
            time: na(),
            temperature_max: na(),
            temperature_min: na(),
            humidity: na(),
            pressure: na(),
            visibility: na(),
            uv_index: na(),
            wind_speed: na(),
            air_quality: na(),
            description: na(),
            url: url.to_string(),
            stop_point: StopPoint::Failed {
                stage: stage.to_string(),
                province: province.to_string(),
                district: district.to_string(),
            },
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.stop_point.is_failed()
    }

    /// 按CSV列顺序输出字段
    pub fn to_fields(&self) -> [String; 15] {
        [
            self.province.clone(),
            self.district.clone(),
            self.date.clone(),
            self.time.clone(),
            self.temperature_max.clone(),
            self.temperature_min.clone(),
            self.humidity.clone(),
            self.pressure.clone(),
            self.visibility.clone(),
            self.uv_index.clone(),
            self.wind_speed.clone(),
            self.air_quality.clone(),
            self.description.clone(),
            self.url.clone(),
            self.stop_point.to_string(),
        ]
    }

    /// 从CSV列还原记录
    pub fn from_fields(fields: &[String]) -> Result<Self, String> {
        if fields.len() != CSV_HEADER.len() {
            return Err(format!(
                "expected {} fields, got {}",
                CSV_HEADER.len(),
                fields.len()
            ));
        }
        Ok(Self {
            province: fields[0].clone(),
            district: fields[1].clone(),
            date: fields[2].clone(),
            time: fields[3].clone(),
            temperature_max: fields[4].clone(),
            temperature_min: fields[5].clone(),
            humidity: fields[6].clone(),
            pressure: fields[7].clone(),
            visibility: fields[8].clone(),
            uv_index: fields[9].clone(),
            wind_speed: fields[10].clone(),
            air_quality: fields[11].clone(),
            description: fields[12].clone(),
            url: fields[13].clone(),
            stop_point: fields[14].parse()?,
        })
    }
}
