use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{middleware::metrics_middleware, state::AppState};

pub mod error;
pub mod expenses;
pub mod health;
pub mod prices;
pub mod transactions;

pub use error::ApiError;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // 健康检查
        .route("/health", get(health::health_check))
        // 交易快照
        .route("/api/transactions", post(transactions::ingest_transactions))
        // gas 花费
        .route("/api/expenses", get(expenses::get_expenses))
        // 价格历史
        .route("/api/prices", get(prices::list_prices))
        // 指标
        .route("/metrics", get(health::metrics))
}

/// 挂载中间件并绑定状态
pub fn build_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    create_routes()
        .layer(from_fn_with_state(state.clone(), metrics_middleware))
        .layer(middleware)
        .with_state(state)
}
