use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pollbox_core::error::CoreError;
use pollbox_models::QuestionId;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("not found")]
    NotFound,
    #[error("store unavailable")]
    StoreUnavailable(String),
    #[error("question {question_id} was created without its choices")]
    PartialWrite { question_id: QuestionId },
}

impl ApiError {
    /// Machine-readable error code string.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::PartialWrite { .. } => "PARTIAL_WRITE_FAILURE",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::PartialWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let details = match &self {
            ApiError::StoreUnavailable(reason) => {
                tracing::warn!("store unavailable: {reason}");
                Value::Null
            }
            ApiError::PartialWrite { question_id } => {
                tracing::error!(%question_id, "partial write surfaced to client");
                json!({ "question_id": question_id.to_string() })
            }
            _ => Value::Null,
        };

        let body = json!({
            "code": code,
            "message": self.to_string(),
            "details": details,
        });

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            CoreError::NotFound => ApiError::NotFound,
            CoreError::StoreUnavailable(msg) => ApiError::StoreUnavailable(msg),
            CoreError::PartialWriteFailure { question_id } => {
                ApiError::PartialWrite { question_id }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}
