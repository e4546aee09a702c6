//! HTTP error mapping
//!
//! | Status | Cause |
//! |--------|-------|
//! | 400 | Invalid label, geometry or request body |
//! | 404 | Unknown job or profile |
//! | 409 | Job state forbids the operation |
//! | 502 | Printer missing, busy or failing |
//! | 500 | Anything else |
//!
//! Body: `{ "success": false, "error": "...", "code": "..." }`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use label_printer::PrintError;
use serde::Serialize;
use tracing::error;

use crate::printing::QueueError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    /// 400
    Validation(String),

    #[error("Resource not found: {0}")]
    /// 404
    NotFound(String),

    #[error("Conflict: {0}")]
    /// 409
    Conflict(String),

    #[error("Printer error: {0}")]
    /// 502
    Device(String),

    #[error("Internal server error: {0}")]
    /// 500
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Device(_) => (StatusCode::BAD_GATEWAY, "PRINTER"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = match &self {
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Device(msg) => msg.clone(),
        };

        let body = Json(ErrorBody {
            success: false,
            error: message,
            code,
        });
        (status, body).into_response()
    }
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::InvalidLabel(_) | QueueError::InvalidGeometry(_) => {
                AppError::Validation(err.to_string())
            }
            QueueError::NotFound(_) => AppError::NotFound(err.to_string()),
            QueueError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            QueueError::Internal(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<PrintError> for AppError {
    fn from(err: PrintError) -> Self {
        match err {
            PrintError::InvalidLabel(_)
            | PrintError::InvalidGeometry(_)
            | PrintError::InvalidConfig(_) => AppError::Validation(err.to_string()),
            PrintError::NotFound(_) | PrintError::DeviceNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            PrintError::ClaimFailed(_)
            | PrintError::NotConnected
            | PrintError::Transfer(_)
            | PrintError::DeviceGone(_)
            | PrintError::Timeout(_) => AppError::Device(err.to_string()),
            PrintError::Io(_) => AppError::Internal(err.to_string()),
        }
    }
}
