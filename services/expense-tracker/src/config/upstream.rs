use anyhow::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 第三方 API 配置（Etherscan 交易列表、CoinGecko 报价）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub etherscan_base_url: String,
    pub etherscan_api_key: Option<String>,
    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    /// CoinGecko 资产 id
    pub asset_id: String,
    /// 报价法币，例如 `inr`
    pub fiat_currency: String,
    /// 未设置时不限制请求时长
    pub request_timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            etherscan_base_url: "https://api.etherscan.io/api".to_string(),
            etherscan_api_key: None,
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            coingecko_api_key: None,
            asset_id: "ethereum".to_string(),
            fiat_currency: "inr".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// 空白的 API key 视为未设置
    pub fn drop_blank_keys(&mut self) {
        for key in [&mut self.etherscan_api_key, &mut self.coingecko_api_key] {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                *key = None;
            }
        }
    }

    /// 构建共享的 HTTP 客户端
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("expense-tracker/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = self.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(builder.build()?)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.etherscan_base_url)
            .map_err(|e| anyhow::anyhow!("Invalid etherscan base url: {}", e))?;
        Url::parse(&self.coingecko_base_url)
            .map_err(|e| anyhow::anyhow!("Invalid coingecko base url: {}", e))?;

        if self.asset_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Asset id cannot be empty"));
        }

        if self.fiat_currency.trim().is_empty() {
            return Err(anyhow::anyhow!("Fiat currency cannot be empty"));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        Ok(())
    }
}
