//! Business service - registration, listing, deletion and QR download.
//!
//! Keeps the record collection and the QR artifact directory in step: a
//! business has exactly one artifact while it exists and none afterwards.
//! Every path that writes or removes an artifact holds that business's
//! artifact lock and checks the record under it, so a download racing a
//! delete cannot bring the artifact back.

use crate::{
    error::AppError,
    middleware::identity::CallerContext,
    models::business::{Business, BusinessId, CreateBusinessRequest},
    services::qr_service::QrProvisioner,
    store::{RecordStore, ScanRetention},
};

/// Register a business for the caller and issue its QR artifact.
///
/// # Process
///
/// 1. Pick an id not used by any stored business
/// 2. Validate the request (nothing is written if this fails)
/// 3. Store the record and issue the QR artifact under the id's lock
/// 4. On issuance failure the record is removed again
///
/// # Errors
///
/// - `InvalidInput`: a field failed validation
/// - `Store`: collection unreadable or unwritable
/// - `Qr`: artifact could not be rendered or written
pub async fn create_business(
    store: &dyn RecordStore,
    qr: &QrProvisioner,
    caller: &CallerContext,
    request: CreateBusinessRequest,
    base_url: &str,
) -> Result<Business, AppError> {
    let id = unused_id(store).await?;
    let business = request.into_business(id, &caller.email)?;

    let slot = qr.lock(&business.id).await?;
    store.put_business(business.clone()).await?;

    if let Err(err) = slot.issue(base_url).await {
        if let Err(rollback) = store
            .delete_business(&business.id, ScanRetention::Retain)
            .await
        {
            tracing::error!(
                business_id = %business.id,
                error = %rollback,
                "failed to roll back business after QR issuance failure"
            );
        }
        return Err(err.into());
    }

    tracing::info!(business_id = %business.id, owner = %caller.email, "registered business");
    Ok(business)
}

async fn unused_id(store: &dyn RecordStore) -> Result<BusinessId, AppError> {
    let existing = store.list_businesses().await?;
    loop {
        let candidate = BusinessId::generate();
        if !existing.iter().any(|b| b.id == candidate) {
            return Ok(candidate);
        }
    }
}

/// Businesses visible to the caller, in store order.
pub async fn list_businesses(
    store: &dyn RecordStore,
    caller: &CallerContext,
) -> Result<Vec<Business>, AppError> {
    let mut businesses = store.list_businesses().await?;
    businesses.retain(|b| caller.can_manage(b));
    Ok(businesses)
}

/// Fetch a business the caller is allowed to manage.
///
/// # Errors
///
/// - `BusinessNotFound`: no record with this id
/// - `Forbidden`: record belongs to another owner
pub async fn get_managed_business(
    store: &dyn RecordStore,
    caller: &CallerContext,
    id: &BusinessId,
) -> Result<Business, AppError> {
    let business = store
        .get_business(id)
        .await?
        .ok_or(AppError::BusinessNotFound)?;

    if !caller.can_manage(&business) {
        return Err(AppError::Forbidden);
    }
    Ok(business)
}

/// PNG bytes of a managed business's QR code.
///
/// A missing artifact file is regenerated first, but only while the record
/// still exists under the artifact lock.
pub async fn qr_code_png(
    store: &dyn RecordStore,
    qr: &QrProvisioner,
    caller: &CallerContext,
    id: &BusinessId,
    base_url: &str,
) -> Result<Vec<u8>, AppError> {
    get_managed_business(store, caller, id).await?;

    let slot = qr.lock(id).await?;
    if store.get_business(id).await?.is_none() {
        return Err(AppError::BusinessNotFound);
    }

    let artifact = slot.ensure(base_url).await?;
    tracing::debug!(
        business_id = %artifact.business_id,
        path = %artifact.path.display(),
        target = %artifact.target_url,
        "serving QR artifact"
    );

    slot.read().await?.ok_or(AppError::BusinessNotFound)
}

/// Delete a business and retire its QR artifact.
///
/// Deleting an id that has no record is a no-op. The artifact is retired
/// before the record goes away, both under the artifact lock: if the record
/// delete then fails, the business merely lacks an artifact, which is
/// regenerated on demand. Under `Purge` the store drops the scan history in
/// the same step as the record.
pub async fn delete_business(
    store: &dyn RecordStore,
    qr: &QrProvisioner,
    caller: &CallerContext,
    id: &BusinessId,
    retention: ScanRetention,
) -> Result<(), AppError> {
    let Some(business) = store.get_business(id).await? else {
        tracing::debug!(business_id = %id, "delete of unknown business ignored");
        return Ok(());
    };

    if !caller.can_manage(&business) {
        return Err(AppError::Forbidden);
    }

    let slot = qr.lock(id).await?;
    // A concurrent delete may have finished while we waited.
    if store.get_business(id).await?.is_none() {
        return Ok(());
    }

    slot.retire().await?;
    store.delete_business(id, retention).await?;

    tracing::info!(business_id = %id, by = %caller.email, "deleted business");
    Ok(())
}
