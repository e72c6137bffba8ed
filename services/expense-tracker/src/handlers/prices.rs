use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::error;

use super::ApiError;
use crate::{models::PriceSample, state::AppState};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
pub struct PriceHistoryQuery {
    pub limit: Option<u32>,
}

impl PriceHistoryQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// 最近的价格采样，按时间倒序
pub async fn list_prices(
    State(state): State<AppState>,
    Query(query): Query<PriceHistoryQuery>,
) -> Result<Json<Vec<PriceSample>>, ApiError> {
    state
        .price_store
        .recent(query.limit())
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Failed to list price samples");
            ApiError::Internal
        })
}
