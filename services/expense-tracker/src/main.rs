mod config;
mod connectors;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
mod storage;

use anyhow::Result;
use shared_utils::{AppMetrics, LoggingInitializer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{config::ExpenseTrackerConfig, handlers::build_router, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 加载配置
    let config = ExpenseTrackerConfig::load()?;

    // 初始化日志，guard 需保留到进程退出以刷新文件日志
    let _log_guard = LoggingInitializer::init(&config.logging)?;
    info!("Expense tracker configuration loaded");

    // 初始化指标
    let metrics = Arc::new(AppMetrics::new()?);

    // 创建应用状态
    let state = AppState::new(config.clone(), metrics).await?;
    info!(storage = state.storage_backend(), "Application state initialized");

    // 启动价格轮询
    let poller = if config.poller.enabled {
        Some(state.price_poller().spawn())
    } else {
        warn!("Price poller is disabled, expenses will fail until a price sample exists");
        None
    };

    let app = build_router(state);

    // 启动服务器
    let addr = config.server.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("🚀 Expense tracker server starting on {}", addr);
    info!("📊 Metrics available at http://{}/metrics", addr);
    info!("🏥 Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(poller) = poller {
        if let Err(e) = poller.shutdown().await {
            warn!(error = %e, "Price poller did not stop cleanly");
        }
    }

    info!("Expense tracker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
