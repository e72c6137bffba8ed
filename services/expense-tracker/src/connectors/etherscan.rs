use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared_utils::AppMetrics;
use std::sync::Arc;
use tracing::{debug, warn};

use super::TransactionSource;
use crate::models::{ExpenseError, ExpenseResult, RawTransaction};

const API_NAME: &str = "etherscan";

/// Etherscan `account/txlist` 客户端
pub struct EtherscanClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    metrics: Arc<AppMetrics>,
}

#[derive(Debug, Deserialize)]
struct TxListResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    result: serde_json::Value,
}

impl EtherscanClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            metrics,
        }
    }

    async fn request_txlist(&self, address: &str) -> ExpenseResult<Vec<RawTransaction>> {
        let mut request = self.client.get(&self.base_url).query(&[
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("sort", "asc"),
        ]);

        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ExpenseError::Upstream(format!(
                "Etherscan returned HTTP {}",
                response.status()
            )));
        }

        let body: TxListResponse = response.json().await?;

        // 无交易时 status 为 "0" 但 result 仍是空数组
        match body.result {
            serde_json::Value::Array(transactions) => Ok(transactions),
            other => Err(ExpenseError::Upstream(format!(
                "Etherscan error (status {}, {}): {}",
                body.status.as_deref().unwrap_or("?"),
                body.message.as_deref().unwrap_or("no message"),
                other
            ))),
        }
    }
}

#[async_trait]
impl TransactionSource for EtherscanClient {
    async fn fetch_transactions(&self, address: &str) -> ExpenseResult<Vec<RawTransaction>> {
        let result = self.request_txlist(address).await;
        self.metrics.record_upstream_call(API_NAME, result.is_ok());

        match &result {
            Ok(transactions) => debug!(
                address = %address,
                count = transactions.len(),
                "Fetched transaction list"
            ),
            Err(e) => warn!(address = %address, error = %e, "Transaction list fetch failed"),
        }

        result
    }
}
