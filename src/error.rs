//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::services::qr_service::QrError;
use crate::store::StoreError;

/// Application-wide error type.
///
/// Every failure is reported to the request that triggered it. Nothing here is
/// fatal to the process.
///
/// # Error Categories
///
/// - **Storage Errors**: corrupt or unavailable collections (`StoreError`)
/// - **Artifact Errors**: QR encoding or PNG write failures (`QrError`)
/// - **Identity Errors**: missing caller context or insufficient rights
/// - **Resource Errors**: unknown business ids
/// - **Validation Errors**: malformed registration fields
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A persisted collection could not be read or written.
    ///
    /// Returns HTTP 500. Details are logged, not returned.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// QR artifact could not be encoded or written.
    ///
    /// Returns HTTP 500.
    #[error("QR artifact error: {0}")]
    Qr(#[from] QrError),

    /// No caller identity was forwarded with the request.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Missing or invalid caller identity")]
    Unauthenticated,

    /// Caller is authenticated but does not own the resource.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Not allowed to access this business")]
    Forbidden,

    /// Referenced business id has no record.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Business not found")]
    BusinessNotFound,

    /// A public QR link points at a business that does not exist.
    ///
    /// Returns HTTP 404 Not Found. No scan is recorded.
    #[error("Invalid QR")]
    InvalidCode,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid input")]
    InvalidInput(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `Unauthenticated` → 401 Unauthorized
/// - `Forbidden` → 403 Forbidden
/// - `BusinessNotFound`, `InvalidCode` → 404 Not Found
/// - `InvalidInput` → 400 Bad Request
/// - `Store`, `Qr` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                self.to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::BusinessNotFound => (
                StatusCode::NOT_FOUND,
                "business_not_found",
                self.to_string(),
            ),
            AppError::InvalidCode => (StatusCode::NOT_FOUND, "invalid_code", self.to_string()),
            AppError::InvalidInput(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone())
            }
            AppError::Store(ref err) => {
                tracing::error!(error = %err, "store failure");
                let code = match err {
                    StoreError::CorruptData { .. } => "corrupt_data",
                    StoreError::Io { .. } => "storage_unavailable",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Qr(ref err) => {
                tracing::error!(error = %err, "qr artifact failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "qr_artifact_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
