// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::location::{DistrictInfo, ProvinceInfo};
use crate::domain::services::extraction_service::{
    element_attr, element_text, extract_text, get_with_retry, Extraction,
};
use crate::engines::session::{BrowserSession, Element, Locator, Scope};
use crate::utils::retry_policy::RetryPolicy;
use std::collections::HashSet;
use tracing::{info, warn};

const PROVINCE_LINKS: &str = ".dropdown-menu .mega-submenu a";
const REGION_BLOCKS: &str = "div.col-megamenu";
const REGION_TITLE: &str = "h6";
const REGION_LINKS: &str = "ul.mega-submenu a";
const DISTRICT_LINKS: &str = ".khu-vuc-lan-can a";

/// 获取所有省份
///
/// # 参数
///
/// * `session` - 浏览器会话
/// * `base_url` - 网站首页
/// * `region` - 只返回该区域（菜单中 `h6` 标题完全相同的分组）下的省份；None表示全部
/// * `hourly_suffix` - 逐小时页面后缀
/// * `policy` - 页面加载重试策略
///
/// # 返回值
///
/// 按页面顺序排列、URL去重后的省份列表。页面无法加载或没有链接时返回空列表。
pub async fn get_all_provinces(
    session: &mut BrowserSession,
    base_url: &str,
    region: Option<&str>,
    hourly_suffix: &str,
    policy: &RetryPolicy,
) -> Vec<ProvinceInfo> {
    if let Err(e) = get_with_retry(session, base_url, policy).await {
        warn!(url = base_url, error = %e, "province listing unavailable");
        return Vec::new();
    }

    let links = match region {
        None => select_all(session, Scope::Page, PROVINCE_LINKS),
        Some(region) => {
            let region = region.trim();
            let blocks = select_all(session, Scope::Page, REGION_BLOCKS);
            let block = blocks.iter().find(|block| {
                matches!(
                    extract_text(session, Scope::Element(*block), &Locator::css(REGION_TITLE)),
                    Extraction::Found(ref title) if title == region
                )
            });
            match block {
                Some(block) => select_all(session, Scope::Element(block), REGION_LINKS),
                None => {
                    warn!(region, "region not found in province menu");
                    Vec::new()
                }
            }
        }
    };

    let provinces: Vec<ProvinceInfo> = collect_links(session, &links, |link| {
        element_attr(link, "title")
            .or_else(|| element_text(link))
            .or_default_text("")
    })
    .into_iter()
    .map(|(name, url)| ProvinceInfo::new(name, url, hourly_suffix))
    .collect();

    info!(count = provinces.len(), "provinces enumerated");
    provinces
}

/// 获取某个省份下的所有区县
///
/// 区县名称取链接文本，页面无法加载时返回空列表。
pub async fn get_districts_of_province(
    session: &mut BrowserSession,
    province_url: &str,
    hourly_suffix: &str,
    policy: &RetryPolicy,
) -> Vec<DistrictInfo> {
    if let Err(e) = get_with_retry(session, province_url, policy).await {
        warn!(url = province_url, error = %e, "district listing unavailable");
        return Vec::new();
    }

    let links = select_all(session, Scope::Page, DISTRICT_LINKS);
    collect_links(session, &links, |link| {
        element_text(link)
            .or_else(|| element_attr(link, "title"))
            .or_default_text("")
    })
    .into_iter()
    .map(|(name, url)| DistrictInfo::new(name, url, hourly_suffix))
    .collect()
}

fn select_all(session: &BrowserSession, scope: Scope<'_>, css: &str) -> Vec<Element> {
    session.select(scope, &Locator::css(css)).unwrap_or_default()
}

// Drops links without a name or a resolvable href, and repeated URLs.
fn collect_links<F>(
    session: &BrowserSession,
    links: &[Element],
    name_of: F,
) -> Vec<(String, String)>
where
    F: Fn(&Element) -> String,
{
    let mut seen = HashSet::new();
    links
        .iter()
        .filter_map(|link| {
            let name = name_of(link);
            if name.is_empty() {
                return None;
            }
            let url = session.resolve_url(link.attr("href")?)?;
            seen.insert(url.clone()).then_some((name, url))
        })
        .collect()
}

#[cfg(test)]
#[path = "listing_service_test.rs"]
mod tests;
