use serde::Deserialize;

pub use shared_models::{ExpenseSummary, PriceSample, RawTransaction, TransactionRecord};

/// 拉取交易请求
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub address: String,
}

/// 查询花费参数
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    pub address: Option<String>,
}

/// 服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Address not found: {0}")]
    NotFound(String),

    #[error("Calculation failed: {0}")]
    Calculation(String),
}

impl ExpenseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExpenseError::NotFound(_))
    }
}

impl From<sqlx::Error> for ExpenseError {
    fn from(err: sqlx::Error) -> Self {
        ExpenseError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for ExpenseError {
    fn from(err: reqwest::Error) -> Self {
        ExpenseError::Upstream(err.to_string())
    }
}

pub type ExpenseResult<T> = Result<T, ExpenseError>;
