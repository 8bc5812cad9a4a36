use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{error::AppError, utils::upload::UploadValidationError};
use query_pipeline::QueryError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::EyeLevel(_) => {
                tracing::error!("Upstream error: {:?}", err);
                Self::Upstream("Document service request failed".to_string())
            }
            AppError::OpenAI(_) | AppError::CompletionParsing(_) => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        tracing::error!("Query pipeline error: {:?}", err);
        match err {
            QueryError::Retrieval(_) => Self::Upstream("Context retrieval failed".to_string()),
            QueryError::Completion(_) => Self::Upstream("Answer generation failed".to_string()),
        }
    }
}

impl From<UploadValidationError> for ApiError {
    fn from(err: UploadValidationError) -> Self {
        match err {
            UploadValidationError::UnsupportedType(message) => Self::ValidationError(message),
            UploadValidationError::PayloadTooLarge(message) => Self::PayloadTooLarge(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::InternalError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::PayloadTooLarge(message) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::Upstream(message) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}
