//! Health check endpoint for service monitoring.

use crate::{error::AppError, state::AppState};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
///
/// Returns service status and the active storage backend.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Storage backend name ("file" or "memory")
    pub store: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - The businesses collection can be read and parsed
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "store": "file",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// # Response (500 Internal Server Error)
///
/// If storage is unreadable or corrupt, returns standard error response.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.list_businesses().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        store: state.store.backend_name().to_string(),
        timestamp: Utc::now(),
    }))
}
