use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 区块浏览器返回的原始交易条目，按原样透传和存储
pub type RawTransaction = serde_json::Value;

/// 某个地址的一次交易列表快照
///
/// 每次拉取都会生成一条新记录，同一地址可以有多条记录。
/// `transactions` 写入后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub address: String,
    pub transactions: Vec<RawTransaction>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(address: impl Into<String>, transactions: Vec<RawTransaction>) -> Self {
        Self::with_timestamp(address, transactions, Utc::now())
    }

    pub fn with_timestamp(
        address: impl Into<String>,
        transactions: Vec<RawTransaction>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            transactions,
            created_at,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
