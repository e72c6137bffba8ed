use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// 对外暴露的错误，响应体固定为 `{"error": "<message>"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to fetch transactions")]
    FetchFailed,

    #[error("Address not found")]
    AddressNotFound,

    #[error("Failed to calculate expenses")]
    CalculationFailed,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// 转换为HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AddressNotFound => StatusCode::NOT_FOUND,
            ApiError::FetchFailed | ApiError::CalculationFailed | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
