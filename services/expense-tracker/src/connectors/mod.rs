pub mod coingecko;
pub mod etherscan;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{ExpenseResult, RawTransaction};

pub use coingecko::CoinGeckoClient;
pub use etherscan::EtherscanClient;

/// 交易列表数据源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// 拉取地址的全部交易，按时间升序
    async fn fetch_transactions(&self, address: &str) -> ExpenseResult<Vec<RawTransaction>>;
}

/// 法币报价数据源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self) -> ExpenseResult<Decimal>;
}
