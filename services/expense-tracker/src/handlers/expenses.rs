use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::{error, warn};

use super::ApiError;
use crate::{
    models::{ExpenseQuery, ExpenseSummary},
    state::AppState,
};

/// 查询地址的累计 gas 花费和最新价格
pub async fn get_expenses(
    State(state): State<AppState>,
    query: Result<Query<ExpenseQuery>, QueryRejection>,
) -> Result<Json<ExpenseSummary>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        warn!(error = %rejection, "Unreadable expense query");
        ApiError::CalculationFailed
    })?;
    let address = query.address.unwrap_or_default();

    match state.expense_service.compute_expense(&address).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) if e.is_not_found() => Err(ApiError::AddressNotFound),
        Err(e) => {
            error!(address = %address, error = %e, "Failed to calculate expenses");
            Err(ApiError::CalculationFailed)
        }
    }
}
