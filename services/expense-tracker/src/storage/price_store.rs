use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;

use super::PriceRepository;
use crate::models::{ExpenseResult, PriceSample};

/// 价格采样存储（Postgres）
#[derive(Clone)]
pub struct PriceStore {
    pool: Arc<PgPool>,
}

impl PriceStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn row_to_sample(row: PgRow) -> ExpenseResult<PriceSample> {
        Ok(PriceSample {
            id: row.try_get("id")?,
            price: row.try_get("price")?,
            timestamp: row.try_get("sampled_at")?,
        })
    }
}

#[async_trait]
impl PriceRepository for PriceStore {
    async fn insert(&self, sample: &PriceSample) -> ExpenseResult<()> {
        sqlx::query("INSERT INTO price_samples (id, price, sampled_at) VALUES ($1, $2, $3)")
            .bind(sample.id)
            .bind(sample.price)
            .bind(sample.timestamp)
            .execute(&*self.pool)
            .await?;

        Ok(())
    }

    async fn latest(&self) -> ExpenseResult<Option<PriceSample>> {
        let query = r#"
            SELECT id, price, sampled_at FROM price_samples
            ORDER BY sampled_at DESC, seq DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query).fetch_optional(&*self.pool).await?;

        row.map(Self::row_to_sample).transpose()
    }

    async fn recent(&self, limit: u32) -> ExpenseResult<Vec<PriceSample>> {
        let query = r#"
            SELECT id, price, sampled_at FROM price_samples
            ORDER BY sampled_at DESC, seq DESC
            LIMIT $1
        "#;

        let rows = sqlx::query(query)
            .bind(limit as i64)
            .fetch_all(&*self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_sample).collect()
    }

    async fn health_check(&self) -> ExpenseResult<()> {
        sqlx::query("SELECT 1").fetch_one(&*self.pool).await?;
        Ok(())
    }
}
