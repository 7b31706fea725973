use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::api_response::ApiResponse;

/// Shown when the data provider fails without saying why.
pub const GENERIC_FETCH_ERROR: &str = "Failed to fetch alkanes balances";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustomError {
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    FetchError(String),

    #[error("Session not found: {0}")]
    SessionNotFoundError(Uuid),

    #[error("Unsupported network: {0}")]
    UnsupportedNetworkError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl CustomError {
    pub fn missing_address() -> Self {
        CustomError::ValidationError("missing address".to_string())
    }

    pub fn invalid_address() -> Self {
        CustomError::ValidationError("invalid address".to_string())
    }

    /// Fetch error carrying the provider's message, or the generic one.
    pub fn fetch(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            CustomError::FetchError(GENERIC_FETCH_ERROR.to_string())
        } else {
            CustomError::FetchError(message)
        }
    }
}

// Custom Error type
#[derive(Debug, Serialize)]
pub struct ApiError {
    code: u16,
    message: String,
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match self {
            CustomError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CustomError::FetchError(_) => StatusCode::BAD_GATEWAY,
            CustomError::SessionNotFoundError(_) => StatusCode::NOT_FOUND,
            CustomError::UnsupportedNetworkError(_) => StatusCode::BAD_REQUEST,
            CustomError::NetworkError(_) => StatusCode::BAD_GATEWAY,
            CustomError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let api_error = ApiError {
            code: status.as_u16(),
            message: self.to_string(),
        };

        let response = ApiResponse {
            status: "FAILURE".to_string(),
            code: api_error.code,
            result: None::<()>,
            error: Some(api_error),
        };

        HttpResponse::build(status).json(response)
    }
}
