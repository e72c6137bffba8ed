use shared_utils::AppMetrics;
use std::sync::Arc;
use tracing::info;

use crate::{
    connectors::TransactionSource,
    models::{ExpenseError, ExpenseResult, RawTransaction, TransactionRecord},
    storage::TransactionRepository,
};

/// 交易拉取服务
#[derive(Clone)]
pub struct IngestService {
    source: Arc<dyn TransactionSource>,
    store: Arc<dyn TransactionRepository>,
    metrics: Arc<AppMetrics>,
}

impl IngestService {
    pub fn new(
        source: Arc<dyn TransactionSource>,
        store: Arc<dyn TransactionRepository>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            source,
            store,
            metrics,
        }
    }

    /// 拉取地址交易并追加一条快照，原样返回上游结果
    ///
    /// 重复调用同一地址会生成新的记录，不做去重。
    pub async fn ingest(&self, address: &str) -> ExpenseResult<Vec<RawTransaction>> {
        if address.trim().is_empty() {
            return Err(ExpenseError::InvalidInput("address is required".to_string()));
        }

        let transactions = self.source.fetch_transactions(address).await?;
        let record = TransactionRecord::new(address, transactions);
        self.store.insert(&record).await?;
        self.metrics.record_created("transaction_record");

        info!(
            address = %record.address,
            record_id = %record.id,
            transactions = record.len(),
            "Transaction snapshot stored"
        );

        Ok(record.transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::MockTransactionSource;
    use crate::storage::MemoryTransactionStore;
    use serde_json::json;

    fn service_with(
        source: MockTransactionSource,
    ) -> (IngestService, Arc<MemoryTransactionStore>, Arc<AppMetrics>) {
        let store = Arc::new(MemoryTransactionStore::new());
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let service = IngestService::new(Arc::new(source), store.clone(), metrics.clone());
        (service, store, metrics)
    }

    #[tokio::test]
    async fn test_ingest_passes_through_and_stores_one_record() {
        let upstream = vec![
            json!({"hash": "0x1", "gasUsed": "21000", "gasPrice": "1000000000"}),
            json!({"hash": "0x2", "gasUsed": "42000", "gasPrice": "3", "input": "0x"}),
        ];
        let expected = upstream.clone();

        let mut source = MockTransactionSource::new();
        source
            .expect_fetch_transactions()
            .withf(|address| address.to_string() == "0xabc")
            .times(1)
            .returning(move |_| Ok(upstream.clone()));

        let (service, store, metrics) = service_with(source);
        let returned = service.ingest("0xabc").await.unwrap();

        assert_eq!(returned, expected);
        assert_eq!(store.count_for_address("0xabc"), 1);
        let stored = store.latest_for_address("0xabc").await.unwrap().unwrap();
        assert_eq!(stored.transactions, expected);
        assert_eq!(metrics.records_created("transaction_record"), 1);
    }

    #[tokio::test]
    async fn test_repeated_ingest_appends_new_records() {
        let mut source = MockTransactionSource::new();
        source
            .expect_fetch_transactions()
            .times(3)
            .returning(|_| Ok(vec![json!({"gasUsed": "1", "gasPrice": "1"})]));

        let (service, store, _) = service_with(source);
        for expected in 1..=3 {
            service.ingest("0xabc").await.unwrap();
            assert_eq!(store.count_for_address("0xabc"), expected);
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_stores_nothing() {
        let mut source = MockTransactionSource::new();
        source
            .expect_fetch_transactions()
            .returning(|_| Err(ExpenseError::Upstream("connection refused".to_string())));

        let (service, store, _) = service_with(source);
        let err = service.ingest("0xabc").await.unwrap_err();

        assert!(matches!(err, ExpenseError::Upstream(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_address_is_rejected_without_upstream_call() {
        let mut source = MockTransactionSource::new();
        source.expect_fetch_transactions().never();

        let (service, store, _) = service_with(source);
        let err = service.ingest("   ").await.unwrap_err();

        assert!(matches!(err, ExpenseError::InvalidInput(_)));
        assert!(store.is_empty());
    }
}
