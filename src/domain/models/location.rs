// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 逐小时页面的默认后缀
pub const DEFAULT_HOURLY_SUFFIX: &str = "/theo-gio";

/// 省份
///
/// 由省份枚举器在每次爬取时创建一次，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvinceInfo {
    /// 省份名称
    pub name: String,
    /// 详情页URL
    pub url: String,
    /// 逐小时页面URL
    pub url_hour: String,
}

impl ProvinceInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>, hourly_suffix: &str) -> Self {
        let url = url.into();
        Self {
            name: name.into(),
            url_hour: hourly_url(&url, hourly_suffix),
            url,
        }
    }
}

/// 区县，结构与省份相同，归属于某个省份
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistrictInfo {
    pub name: String,
    pub url: String,
    pub url_hour: String,
}

impl DistrictInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>, hourly_suffix: &str) -> Self {
        let url = url.into();
        Self {
            name: name.into(),
            url_hour: hourly_url(&url, hourly_suffix),
            url,
        }
    }
}

fn hourly_url(url: &str, suffix: &str) -> String {
    format!("{}{}", url.trim_end_matches('/'), suffix)
}
