pub mod server;
pub mod upstream;

use anyhow::Result;
use config::{builder::DefaultState, ConfigBuilder};
use serde::{Deserialize, Serialize};
use shared_utils::LoggingOptions;
use std::time::Duration;

pub use server::ServerConfig;
pub use upstream::UpstreamConfig;

/// 服务主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseTrackerConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub poller: PollerConfig,
    pub logging: LoggingOptions,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 未配置时使用内存存储
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 10,
            run_migrations: true,
        }
    }
}

/// 旧部署使用的文档库连接变量，不再读取
pub const LEGACY_DATABASE_ENV: &str = "MONGODB_URI";

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// 旧连接变量有值时返回 true，调用方需提示该值被忽略
    pub fn legacy_uri_ignored(legacy_uri: Option<&str>) -> bool {
        legacy_uri.is_some_and(|uri| !uri.trim().is_empty())
    }
}

/// 价格轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// 对齐到整点间隔（与 `*/10 * * * *` 相同的触发时刻）
    pub align_to_boundary: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 600,
            align_to_boundary: true,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ExpenseTrackerConfig {
    /// 加载配置：默认值 -> 配置文件 -> `EXPENSE_TRACKER__*` -> PORT / ETHERSCAN_API_KEY / DATABASE_URL
    pub fn load() -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(config::File::with_name("config/expense-tracker").required(false))
            .add_source(config::Environment::with_prefix("EXPENSE_TRACKER").separator("__"))
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option(
                "upstream.etherscan_api_key",
                std::env::var("ETHERSCAN_API_KEY").ok(),
            )?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?;

        Self::from_builder(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout_secs", 10)?
            .set_default("database.run_migrations", true)?
            .set_default("upstream.etherscan_base_url", "https://api.etherscan.io/api")?
            .set_default("upstream.coingecko_base_url", "https://api.coingecko.com/api/v3")?
            .set_default("upstream.asset_id", "ethereum")?
            .set_default("upstream.fiat_currency", "inr")?
            .set_default("poller.enabled", true)?
            .set_default("poller.interval_secs", 600)?
            .set_default("poller.align_to_boundary", true)?
            .set_default("logging.format", "pretty")?
            .set_default("logging.level", "info")?
            .set_default("logging.file_prefix", "expense-tracker.log")?;

        Ok(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let mut config: ExpenseTrackerConfig = builder.build()?.try_deserialize()?;
        config.upstream.drop_blank_keys();
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.upstream.validate()?;

        if self.poller.interval_secs == 0 {
            return Err(anyhow::anyhow!("Poll interval must be greater than 0"));
        }

        if let Some(url) = &self.database.url {
            if url.trim().is_empty() {
                return Err(anyhow::anyhow!("Database URL cannot be blank"));
            }
        }

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }

        Ok(())
    }
}

impl Default for ExpenseTrackerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            upstream: UpstreamConfig::default(),
            poller: PollerConfig::default(),
            logging: LoggingOptions {
                file_prefix: "expense-tracker.log".to_string(),
                ..Default::default()
            },
        }
    }
}
