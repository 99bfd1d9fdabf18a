//! Scan analytics HTTP handlers.
//!
//! Public polling endpoints:
//! - GET /api/scans/{business_id} - Live scan counter
//! - GET /api/analytics/{business_id} - Per-day chart series
//!
//! Caller-scoped endpoints:
//! - GET /api/owner/analytics - Scan totals for each of the caller's businesses
//! - GET /api/owner/scan-history/{business_id} - Raw scan events of one business
//! - GET /api/admin/summary - Global totals (admin only)

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    middleware::identity::CallerContext,
    models::analytics::{AdminSummary, BusinessScanStat, DayBucketSeries, ScanCountResponse},
    models::business::BusinessId,
    models::scan::ScanEvent,
    services::{analytics_service, scan_service},
    state::AppState,
};

/// Live scan count of one business.
///
/// ```json
/// { "count": 42 }
/// ```
pub async fn scan_count(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<ScanCountResponse>, AppError> {
    let count = analytics_service::count_for(state.store.as_ref(), &business_id).await?;

    Ok(Json(ScanCountResponse { count }))
}

/// Scans per day for charting.
///
/// `labels` and `values` are parallel arrays; days appear in the order they
/// were first seen in the scan log.
///
/// ```json
/// { "labels": ["2024-01-01", "2024-01-02"], "values": [2, 1] }
/// ```
pub async fn analytics_series(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<DayBucketSeries>, AppError> {
    let buckets = analytics_service::day_buckets(state.store.as_ref(), &business_id).await?;
    if !buckets.is_empty() {
        tracing::debug!(
            business_id = %business_id,
            days = buckets.len(),
            scans = buckets.total(),
            "built scan series"
        );
    }

    Ok(Json(buckets.into()))
}

/// Scan totals for every business the caller owns.
///
/// ```json
/// [ { "name": "Blue Door Cafe", "count": 12 } ]
/// ```
pub async fn owner_analytics(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<BusinessScanStat>>, AppError> {
    let stats = analytics_service::owner_summary(state.store.as_ref(), &caller.email).await?;

    Ok(Json(stats))
}

/// Every recorded scan of one managed business, oldest first.
pub async fn scan_history(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<ScanEvent>>, AppError> {
    let scans = scan_service::scan_history(state.store.as_ref(), &caller, &business_id).await?;

    Ok(Json(scans))
}

/// Total businesses and scans. Admin only.
pub async fn admin_summary(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<AdminSummary>, AppError> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden);
    }

    Ok(Json(analytics_service::admin_summary(state.store.as_ref()).await?))
}
