//! Analytics aggregator - reduces the scan log into dashboard figures.
//!
//! Every call reads the whole log; there are no cached counters. Cost grows
//! linearly with the number of stored events.
// TODO: maintain per-business/per-day counters on append once scan logs are
// large enough for full reductions to show up in request latency.

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::analytics::{AdminSummary, BusinessScanStat, DayBuckets},
    models::business::BusinessId,
    store::RecordStore,
};

/// Total scans across all businesses, orphaned events included.
pub async fn count_all(store: &dyn RecordStore) -> Result<u64, AppError> {
    Ok(store.list_scans(None).await?.len() as u64)
}

/// Total scans of one business. Unknown ids count zero.
pub async fn count_for(store: &dyn RecordStore, business_id: &BusinessId) -> Result<u64, AppError> {
    Ok(store.list_scans(Some(business_id)).await?.len() as u64)
}

/// Scans of one business grouped by calendar day, in first-seen day order.
pub async fn day_buckets(
    store: &dyn RecordStore,
    business_id: &BusinessId,
) -> Result<DayBuckets, AppError> {
    let scans = store.list_scans(Some(business_id)).await?;
    Ok(DayBuckets::from_events(&scans))
}

/// Name and scan total of every business owned by `owner_email`, in listing order.
pub async fn owner_summary(
    store: &dyn RecordStore,
    owner_email: &str,
) -> Result<Vec<BusinessScanStat>, AppError> {
    let businesses = store.list_businesses().await?;
    let scans = store.list_scans(None).await?;

    let mut counts: HashMap<&BusinessId, u64> = HashMap::new();
    for scan in &scans {
        *counts.entry(&scan.business_id).or_default() += 1;
    }

    Ok(businesses
        .iter()
        .filter(|b| b.owner_email == owner_email)
        .map(|b| BusinessScanStat {
            name: b.name.clone(),
            count: counts.get(&b.id).copied().unwrap_or(0),
        })
        .collect())
}

/// Global totals for the admin dashboard.
pub async fn admin_summary(store: &dyn RecordStore) -> Result<AdminSummary, AppError> {
    let total_businesses = store.list_businesses().await?.len() as u64;
    let total_scans = count_all(store).await?;
    Ok(AdminSummary {
        total_businesses,
        total_scans,
    })
}
