use async_trait::async_trait;
use parking_lot::RwLock;

use super::{PriceRepository, TransactionRepository};
use crate::models::{ExpenseResult, PriceSample, TransactionRecord};

/// 内存交易存储，未配置数据库时使用
#[derive(Default)]
pub struct MemoryTransactionStore {
    records: RwLock<Vec<TransactionRecord>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_for_address(&self, address: &str) -> usize {
        self.records
            .read()
            .iter()
            .filter(|record| record.address == address)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactionStore {
    async fn insert(&self, record: &TransactionRecord) -> ExpenseResult<()> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn latest_for_address(&self, address: &str) -> ExpenseResult<Option<TransactionRecord>> {
        // max_by_key 在相同时间戳时取最后一个，即最后写入的记录
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|record| record.address == address)
            .max_by_key(|record| record.created_at)
            .cloned())
    }

    async fn health_check(&self) -> ExpenseResult<()> {
        Ok(())
    }
}

/// 内存价格存储
#[derive(Default)]
pub struct MemoryPriceStore {
    samples: RwLock<Vec<PriceSample>>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按写入顺序返回全部采样点
    pub fn snapshot(&self) -> Vec<PriceSample> {
        self.samples.read().clone()
    }
}

#[async_trait]
impl PriceRepository for MemoryPriceStore {
    async fn insert(&self, sample: &PriceSample) -> ExpenseResult<()> {
        self.samples.write().push(sample.clone());
        Ok(())
    }

    async fn latest(&self) -> ExpenseResult<Option<PriceSample>> {
        let samples = self.samples.read();
        Ok(samples
            .iter()
            .max_by_key(|sample| sample.timestamp)
            .cloned())
    }

    async fn recent(&self, limit: u32) -> ExpenseResult<Vec<PriceSample>> {
        let mut samples: Vec<PriceSample> = self.samples.read().iter().rev().cloned().collect();
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        samples.truncate(limit as usize);
        Ok(samples)
    }

    async fn health_check(&self) -> ExpenseResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[tokio::test]
    async fn test_latest_record_is_most_recent_insert() {
        let store = MemoryTransactionStore::new();
        let now = Utc::now();

        let older = TransactionRecord::with_timestamp("0xabc", vec![json!({"n": 1})], now);
        let other = TransactionRecord::with_timestamp("0xdef", vec![], now + Duration::seconds(5));
        let newer = TransactionRecord::with_timestamp("0xabc", vec![json!({"n": 2})], now);

        store.insert(&older).await.unwrap();
        store.insert(&other).await.unwrap();
        store.insert(&newer).await.unwrap();

        let latest = store.latest_for_address("0xabc").await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
        assert_eq!(store.count_for_address("0xabc"), 2);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_address_has_no_record() {
        let store = MemoryTransactionStore::new();
        assert!(store.is_empty());
        assert!(store.latest_for_address("0xabc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_price_uses_max_timestamp() {
        let store = MemoryPriceStore::new();
        let now = Utc::now();

        store.insert(&PriceSample::at(dec!(100), now)).await.unwrap();
        store
            .insert(&PriceSample::at(dec!(300), now + Duration::minutes(20)))
            .await
            .unwrap();
        store
            .insert(&PriceSample::at(dec!(200), now + Duration::minutes(10)))
            .await
            .unwrap();

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.price, dec!(300));

        let recent = store.recent(2).await.unwrap();
        let prices: Vec<_> = recent.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![dec!(300), dec!(200)]);
        assert_eq!(store.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_price_store() {
        let store = MemoryPriceStore::new();
        assert!(store.latest().await.unwrap().is_none());
        assert!(store.recent(10).await.unwrap().is_empty());
    }
}
