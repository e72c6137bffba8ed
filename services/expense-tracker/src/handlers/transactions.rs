use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, warn};

use super::ApiError;
use crate::{
    models::{IngestRequest, RawTransaction},
    state::AppState,
};

/// 拉取并保存地址交易，原样返回上游交易列表
pub async fn ingest_transactions(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<Vec<RawTransaction>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Unreadable transaction request body");
        ApiError::FetchFailed
    })?;

    match state.ingest_service.ingest(&request.address).await {
        Ok(transactions) => Ok(Json(transactions)),
        Err(e) => {
            error!(address = %request.address, error = %e, "Failed to fetch transactions");
            Err(ApiError::FetchFailed)
        }
    }
}
