use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use thiserror::Error;

use crate::copilot::CopilotError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    AuthError(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PaymentRequired(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<CopilotError> for AppError {
    fn from(err: CopilotError) -> Self {
        match err {
            CopilotError::LoginRequired | CopilotError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            CopilotError::SessionNotFound => AppError::NotFound(err.to_string()),
            CopilotError::Busy => AppError::TooManyRequests(err.to_string()),
            CopilotError::QuotaExceeded => AppError::PaymentRequired(err.to_string()),
            CopilotError::Storage(e) => AppError::Database(e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
