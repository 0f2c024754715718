use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::ai::AiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("AI provider error: {0}")]
    ExternalService(String),
    #[error("malformed AI response: {0}")]
    MalformedResponse(String),
    #[error("AI provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::InternalServerError(_) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PreconditionFailed(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalService(_) | AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::DatabaseError(e) => {
                error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            AppError::InternalServerError(msg) => {
                error!("Internal server error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::ProviderUnavailable(msg) => AppError::ProviderUnavailable(msg),
            AiError::MalformedResponse(msg) => AppError::MalformedResponse(msg),
            AiError::Io(e) => AppError::Storage(e.to_string()),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}
