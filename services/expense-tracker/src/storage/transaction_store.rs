use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use std::sync::Arc;

use super::TransactionRepository;
use crate::models::{ExpenseResult, RawTransaction, TransactionRecord};

/// 交易快照存储（Postgres）
#[derive(Clone)]
pub struct TransactionStore {
    pool: Arc<PgPool>,
}

impl TransactionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn row_to_record(row: PgRow) -> ExpenseResult<TransactionRecord> {
        let transactions: Json<Vec<RawTransaction>> = row.try_get("transactions")?;

        Ok(TransactionRecord {
            id: row.try_get("id")?,
            address: row.try_get("address")?,
            transactions: transactions.0,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl TransactionRepository for TransactionStore {
    async fn insert(&self, record: &TransactionRecord) -> ExpenseResult<()> {
        let query = r#"
            INSERT INTO transaction_records (id, address, transactions, created_at)
            VALUES ($1, $2, $3, $4)
        "#;

        sqlx::query(query)
            .bind(record.id)
            .bind(&record.address)
            .bind(Json(&record.transactions))
            .bind(record.created_at)
            .execute(&*self.pool)
            .await?;

        Ok(())
    }

    async fn latest_for_address(&self, address: &str) -> ExpenseResult<Option<TransactionRecord>> {
        let query = r#"
            SELECT id, address, transactions, created_at
            FROM transaction_records
            WHERE address = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(address)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn health_check(&self) -> ExpenseResult<()> {
        sqlx::query("SELECT 1").fetch_one(&*self.pool).await?;
        Ok(())
    }
}
