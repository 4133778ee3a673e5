use crate::orchestration::AnalysisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// The inputs were valid but the ledger or oracle did not hold enough
    /// data to answer.
    #[error("Cannot compute: {message}")]
    Unprocessable {
        reason: &'static str,
        message: String,
    },
    #[error("Upstream service error: {0}")]
    BadGateway(String),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err.insufficient_data_reason() {
            Some(reason) => AppError::Unprocessable {
                reason,
                message: err.to_string(),
            },
            None => AppError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Unprocessable { reason, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "reason": reason }),
            ),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}
