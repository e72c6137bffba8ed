pub mod memory;
pub mod price_store;
pub mod transaction_store;

use async_trait::async_trait;

use crate::models::{ExpenseResult, PriceSample, TransactionRecord};

pub use memory::{MemoryPriceStore, MemoryTransactionStore};
pub use price_store::PriceStore;
pub use transaction_store::TransactionStore;

/// 交易快照存储，只支持追加和读取
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, record: &TransactionRecord) -> ExpenseResult<()>;

    /// 该地址最近写入的一条记录
    async fn latest_for_address(&self, address: &str) -> ExpenseResult<Option<TransactionRecord>>;

    async fn health_check(&self) -> ExpenseResult<()>;
}

/// 价格时间序列存储，只支持追加和读取
#[async_trait]
pub trait PriceRepository: Send + Sync {
    async fn insert(&self, sample: &PriceSample) -> ExpenseResult<()>;

    /// 时间戳最大的采样点（不区分地址）
    async fn latest(&self) -> ExpenseResult<Option<PriceSample>>;

    /// 最近的采样点，按时间倒序
    async fn recent(&self, limit: u32) -> ExpenseResult<Vec<PriceSample>>;

    async fn health_check(&self) -> ExpenseResult<()>;
}
