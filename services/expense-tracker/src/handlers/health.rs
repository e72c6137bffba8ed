use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// 健康检查
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let health_status = json!({
        "service": "expense-tracker",
        "status": "healthy",
        "timestamp": Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage_backend(),
        "transaction_store": state.check_transaction_store_health().await,
        "price_store": state.check_price_store_health().await,
    });

    Json(health_status)
}

/// Prometheus 指标
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.gather() {
        Ok(metrics) => (StatusCode::OK, metrics).into_response(),
        Err(e) => {
            tracing::error!("Failed to gather metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to gather metrics").into_response()
        }
    }
}
