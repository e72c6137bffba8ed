use anyhow::Result;
use shared_utils::AppMetrics;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::{DatabaseConfig, ExpenseTrackerConfig, LEGACY_DATABASE_ENV},
    connectors::{CoinGeckoClient, EtherscanClient, PriceSource, TransactionSource},
    services::{ExpenseService, IngestService, PricePoller},
    storage::{
        MemoryPriceStore, MemoryTransactionStore, PriceRepository, PriceStore,
        TransactionRepository, TransactionStore,
    },
};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: ExpenseTrackerConfig,
    pub metrics: Arc<AppMetrics>,

    // 存储层
    pub transaction_store: Arc<dyn TransactionRepository>,
    pub price_store: Arc<dyn PriceRepository>,

    // 上游数据源
    pub price_source: Arc<dyn PriceSource>,

    // 服务层
    pub ingest_service: Arc<IngestService>,
    pub expense_service: Arc<ExpenseService>,
}

impl AppState {
    pub async fn new(config: ExpenseTrackerConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let (transaction_store, price_store) = Self::connect_storage(&config).await?;

        let http_client = config.upstream.http_client()?;
        if config.upstream.etherscan_api_key.is_none() {
            warn!("ETHERSCAN_API_KEY is not set, Etherscan requests will be heavily rate limited");
        }

        let transaction_source: Arc<dyn TransactionSource> = Arc::new(EtherscanClient::new(
            http_client.clone(),
            config.upstream.etherscan_base_url.clone(),
            config.upstream.etherscan_api_key.clone(),
            metrics.clone(),
        ));
        let price_source: Arc<dyn PriceSource> = Arc::new(CoinGeckoClient::new(
            http_client,
            config.upstream.coingecko_base_url.clone(),
            config.upstream.coingecko_api_key.clone(),
            config.upstream.asset_id.clone(),
            config.upstream.fiat_currency.clone(),
            metrics.clone(),
        ));

        Ok(Self::from_parts(
            config,
            metrics,
            transaction_store,
            price_store,
            transaction_source,
            price_source,
        ))
    }

    /// 由已构建的组件组装状态
    pub fn from_parts(
        config: ExpenseTrackerConfig,
        metrics: Arc<AppMetrics>,
        transaction_store: Arc<dyn TransactionRepository>,
        price_store: Arc<dyn PriceRepository>,
        transaction_source: Arc<dyn TransactionSource>,
        price_source: Arc<dyn PriceSource>,
    ) -> Self {
        let ingest_service = Arc::new(IngestService::new(
            transaction_source,
            transaction_store.clone(),
            metrics.clone(),
        ));
        let expense_service = Arc::new(ExpenseService::new(
            transaction_store.clone(),
            price_store.clone(),
        ));

        Self {
            config,
            metrics,
            transaction_store,
            price_store,
            price_source,
            ingest_service,
            expense_service,
        }
    }

    async fn connect_storage(
        config: &ExpenseTrackerConfig,
    ) -> Result<(Arc<dyn TransactionRepository>, Arc<dyn PriceRepository>)> {
        let legacy_uri = std::env::var(LEGACY_DATABASE_ENV).ok();
        if DatabaseConfig::legacy_uri_ignored(legacy_uri.as_deref()) {
            warn!(
                "{} is set but ignored, configure DATABASE_URL for persistent storage",
                LEGACY_DATABASE_ENV
            );
        }

        let Some(url) = &config.database.url else {
            warn!("DATABASE_URL is not set, using in-memory storage (data is lost on restart)");
            return Ok((
                Arc::new(MemoryTransactionStore::new()),
                Arc::new(MemoryPriceStore::new()),
            ));
        };

        // 创建数据库连接池
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(config.database.connect_timeout())
            .connect(url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        if config.database.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations applied");
        }

        let pool = Arc::new(pool);
        Ok((
            Arc::new(TransactionStore::new(pool.clone())),
            Arc::new(PriceStore::new(pool)),
        ))
    }

    /// 基于当前配置创建价格轮询任务
    pub fn price_poller(&self) -> PricePoller {
        PricePoller::new(
            self.price_source.clone(),
            self.price_store.clone(),
            self.metrics.clone(),
            self.config.poller.interval(),
        )
        .aligned(self.config.poller.align_to_boundary)
    }

    pub fn storage_backend(&self) -> &'static str {
        if self.config.database.url.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    pub async fn check_transaction_store_health(&self) -> String {
        match self.transaction_store.health_check().await {
            Ok(()) => "healthy".to_string(),
            Err(e) => format!("unhealthy: {}", e),
        }
    }

    pub async fn check_price_store_health(&self) -> String {
        match self.price_store.health_check().await {
            Ok(()) => "healthy".to_string(),
            Err(e) => format!("unhealthy: {}", e),
        }
    }
}
