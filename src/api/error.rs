// ABOUTME: HTTP error type for the trigger API.
// ABOUTME: Maps each failure to a status code and a machine-readable code.

use crate::store::StoreError;
use crate::trigger::TriggerError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidImage(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    LockUnavailable(String),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "IMAGE_NOT_ALLOWED"),
            ApiError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "SWAP_IN_PROGRESS"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::LockUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "LOCK_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code, "{}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::Authentication => ApiError::Unauthorized,
            TriggerError::ImageNotAllowed(_) => ApiError::Forbidden(err.to_string()),
            TriggerError::InvalidImage { .. } => ApiError::InvalidImage(err.to_string()),
            TriggerError::InProgress(_) => ApiError::Conflict(err.to_string()),
            TriggerError::Lock(message) => ApiError::LockUnavailable(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidWait(_) => ApiError::Validation(err.to_string()),
            StoreError::Unavailable(_) => ApiError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_errors_map_to_documented_codes() {
        let cases = [
            (TriggerError::Authentication, StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED"),
            (
                TriggerError::ImageNotAllowed("evil.example.com/app:v2".to_string()),
                StatusCode::FORBIDDEN,
                "IMAGE_NOT_ALLOWED",
            ),
            (
                TriggerError::InvalidImage {
                    reference: "x:".to_string(),
                    reason: "bad".to_string(),
                },
                StatusCode::BAD_REQUEST,
                "INVALID_IMAGE",
            ),
            (
                TriggerError::Lock("cannot take swap lock /run/swapd/locks/app.lock".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
                "LOCK_UNAVAILABLE",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(ApiError::from(err).status_and_code(), (status, code));
        }
    }

    #[test]
    fn store_errors_map_to_documented_codes() {
        assert_eq!(
            ApiError::from(StoreError::InvalidWait(0)).status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
        );
        assert_eq!(
            ApiError::from(StoreError::Unavailable("disk".to_string())).status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
        );
    }
}
