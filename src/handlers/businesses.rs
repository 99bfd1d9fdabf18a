//! Business management HTTP handlers.
//!
//! This module implements the owner-facing business endpoints:
//! - POST /api/businesses - Register a business and issue its QR code
//! - GET /api/businesses - List the caller's businesses
//! - DELETE /api/businesses/{id} (also GET /api/businesses/{id}/delete) - Delete a business
//! - GET /api/businesses/{id}/qr - Download the QR code PNG

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::{
    config::Config,
    error::AppError,
    middleware::identity::CallerContext,
    models::business::{BusinessId, BusinessResponse, CreateBusinessRequest},
    services::business_service,
    state::AppState,
};

/// Register a new business.
///
/// # Endpoint
///
/// `POST /api/businesses`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Blue Door Cafe",
///   "category": "restaurant",
///   "external_review_url": "https://g.page/r/blue-door/review",
///   "status": "active"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the stored business, `Location` points at the listing
/// - **Error (400)**: a field failed validation, nothing was stored
/// - **Error (401)**: no caller identity
/// - **Error (500)**: storage or QR artifact failure
///
/// The QR code encodes `<base>/r/<id>`, where `<base>` is `PUBLIC_BASE_URL`
/// or, when unset, the scheme and host this request arrived on.
pub async fn create_business(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    headers: HeaderMap,
    Json(request): Json<CreateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let base_url = request_base_url(&state.config, &headers)?;

    let business = business_service::create_business(
        state.store.as_ref(),
        &state.qr,
        &caller,
        request,
        &base_url,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, "/api/businesses")],
        Json(BusinessResponse::from(business)),
    ))
}

/// List businesses visible to the caller.
///
/// Owners get their own businesses, admins get all of them, both in
/// registration order.
pub async fn list_businesses(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<BusinessResponse>>, AppError> {
    let businesses = business_service::list_businesses(state.store.as_ref(), &caller).await?;

    Ok(Json(businesses.into_iter().map(Into::into).collect()))
}

/// Delete a business and its QR code.
///
/// # Response
///
/// - **204 No Content**: deleted, or there was nothing to delete
/// - **403 Forbidden**: the business belongs to another owner
///
/// Scan history is kept unless `PURGE_SCANS_ON_DELETE` is set.
pub async fn delete_business(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(business_id): Path<BusinessId>,
) -> Result<StatusCode, AppError> {
    business_service::delete_business(
        state.store.as_ref(),
        &state.qr,
        &caller,
        &business_id,
        state.scan_retention(),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Download the QR code of a managed business.
///
/// A missing artifact file is regenerated before it is served. The `ETag` is
/// the SHA-256 of the PNG, so clients revalidate after a re-issue.
pub async fn get_qr_code(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(business_id): Path<BusinessId>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let base_url = request_base_url(&state.config, &headers)?;
    let png = business_service::qr_code_png(
        state.store.as_ref(),
        &state.qr,
        &caller,
        &business_id,
        &base_url,
    )
    .await?;

    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&png)));

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
            (header::ETAG, etag),
        ],
        png,
    )
        .into_response())
}

/// Base URL to encode into QR codes.
///
/// Uses `PUBLIC_BASE_URL` when configured; otherwise honours
/// `X-Forwarded-Proto` / `X-Forwarded-Host` from a reverse proxy and falls
/// back to the `Host` header over plain http.
pub(crate) fn request_base_url(config: &Config, headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(base) = config.public_base_url() {
        return Ok(base.to_string());
    }

    let first_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or_default().trim())
            .filter(|v| !v.is_empty())
    };

    let host = first_value("x-forwarded-host")
        .or_else(|| first_value(header::HOST.as_str()))
        .ok_or_else(|| AppError::InvalidInput("cannot determine public host".to_string()))?;
    let scheme = first_value("x-forwarded-proto").unwrap_or("http");

    let base = format!("{scheme}://{host}");
    let parsed = url::Url::parse(&base)
        .map_err(|_| AppError::InvalidInput("invalid forwarded host".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.path() != "/" {
        return Err(AppError::InvalidInput(
            "invalid forwarded host".to_string(),
        ));
    }

    Ok(base)
}
