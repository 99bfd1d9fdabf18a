//! Scan recorder - appends one event per landing page visit.
//!
//! Every visit counts: there is no deduplication by visitor, device or time
//! window. Anything of that kind belongs in a layer above `record_visit` and
//! must leave the append-only log untouched.

use crate::{
    error::AppError,
    middleware::identity::CallerContext,
    models::business::{Business, BusinessId},
    models::scan::{ScanEvent, ScanTimestamp},
    services::business_service,
    store::RecordStore,
};

/// Record a visit of `business_id`'s landing page.
///
/// # Returns
///
/// The visited business, for rendering the landing page.
///
/// # Errors
///
/// - `InvalidCode`: no such business; nothing is appended
/// - `Store`: the scan log could not be read or written
pub async fn record_visit(
    store: &dyn RecordStore,
    business_id: &BusinessId,
    time: ScanTimestamp,
) -> Result<Business, AppError> {
    // Checked and appended in one store operation so a concurrent delete
    // is ordered entirely before or after this visit.
    let business = store
        .record_scan(ScanEvent::new(business_id.clone(), time))
        .await?
        .ok_or(AppError::InvalidCode)?;

    tracing::debug!(business_id = %business.id, "recorded scan");
    Ok(business)
}

/// Raw scan events of a business the caller manages, oldest first.
pub async fn scan_history(
    store: &dyn RecordStore,
    caller: &CallerContext,
    business_id: &BusinessId,
) -> Result<Vec<ScanEvent>, AppError> {
    business_service::get_managed_business(store, caller, business_id).await?;
    Ok(store.list_scans(Some(business_id)).await?)
}
