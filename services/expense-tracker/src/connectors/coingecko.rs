use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use shared_utils::AppMetrics;
use std::collections::HashMap;
use std::sync::Arc;

use super::PriceSource;
use crate::models::{ExpenseError, ExpenseResult};

const API_NAME: &str = "coingecko";

/// CoinGecko `simple/price` 客户端，固定一个资产和一个法币
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    asset_id: String,
    fiat_currency: String,
    metrics: Arc<AppMetrics>,
}

type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

impl CoinGeckoClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        asset_id: impl Into<String>,
        fiat_currency: impl Into<String>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            asset_id: asset_id.into(),
            fiat_currency: fiat_currency.into().to_lowercase(),
            metrics,
        }
    }

    pub fn pair(&self) -> String {
        format!("{}/{}", self.asset_id, self.fiat_currency)
    }

    async fn request_price(&self) -> ExpenseResult<Decimal> {
        let url = format!("{}/simple/price", self.base_url.trim_end_matches('/'));
        let mut request = self.client.get(&url).query(&[
            ("ids", self.asset_id.as_str()),
            ("vs_currencies", self.fiat_currency.as_str()),
        ]);

        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ExpenseError::Upstream(format!(
                "CoinGecko returned HTTP {}",
                response.status()
            )));
        }

        let body: SimplePriceResponse = response.json().await?;

        let price = body
            .get(&self.asset_id)
            .and_then(|quotes| quotes.get(&self.fiat_currency))
            .copied()
            .ok_or_else(|| {
                ExpenseError::Upstream(format!("CoinGecko response has no {} price", self.pair()))
            })?;

        Decimal::from_f64(price)
            .ok_or_else(|| ExpenseError::Upstream(format!("Unrepresentable price: {}", price)))
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_price(&self) -> ExpenseResult<Decimal> {
        let result = self.request_price().await;
        self.metrics.record_upstream_call(API_NAME, result.is_ok());
        result
    }
}
