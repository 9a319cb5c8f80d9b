// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// 默认的公网IP查询地址
pub const DEFAULT_LOOKUP_URL: &str = "https://checkip.amazonaws.com";

/// 查询失败时的占位值
pub const UNKNOWN_IP: &str = "unknown";

/// 公网IP查询服务
pub struct IdentityService {
    /// 查询端点，返回纯文本IP
    endpoint: String,
    client: reqwest::Client,
}

impl Default for IdentityService {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL.to_string(), Duration::from_secs(5))
    }
}

impl IdentityService {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn fetch(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("User-Agent", "wxcrawl/0.1.0")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "IP lookup returned status {}",
                response.status()
            ));
        }

        let body = response.text().await?;
        let ip = body.trim().parse::<IpAddr>()?;
        Ok(ip)
    }

    /// 查询本机公网IP
    ///
    /// 任何失败（网络错误、非2xx状态、响应不是IP地址）都返回 `"unknown"`。
    pub async fn public_ip(&self) -> String {
        match self.fetch().await {
            Ok(ip) => {
                debug!("Public IP resolved via {}: {}", self.endpoint, ip);
                ip.to_string()
            }
            Err(e) => {
                warn!("Failed to look up public IP via {}: {}", self.endpoint, e);
                UNKNOWN_IP.to_string()
            }
        }
    }
}

/// 查询公网IP的便捷函数
pub async fn lookup_public_ip(url: &str, timeout: Duration) -> String {
    IdentityService::new(url.to_string(), timeout)
        .public_ip()
        .await
}
