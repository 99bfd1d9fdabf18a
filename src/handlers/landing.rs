//! Public QR landing handlers.
//!
//! - GET /r/{business_id} - What a scanned code opens; records the scan
//! - GET /redirect-review?bid= - Forwards to the business's external review page

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::business::BusinessId,
    models::review::LandingPage,
    models::scan::ScanTimestamp,
    services::scan_service,
    state::AppState,
};

/// Landing page for a scanned QR code.
///
/// Records exactly one scan, then returns what the page renders: the
/// business and a suggested review text picked at random from its category.
///
/// # Response
///
/// - **Success (200 OK)**
///
/// ```json
/// {
///   "business_id": "3f9c2a1b",
///   "business_name": "Blue Door Cafe",
///   "category": "restaurant",
///   "review_text": "Lovely food and friendly staff!",
///   "review_link": "/redirect-review?bid=3f9c2a1b"
/// }
/// ```
///
/// - **Error (404 `invalid_code`)**: unknown business, no scan recorded
pub async fn landing_page(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<LandingPage>, AppError> {
    let business =
        scan_service::record_visit(state.store.as_ref(), &business_id, ScanTimestamp::now())
            .await?;

    let catalog = state.store.review_catalog().await?;
    let review_text = catalog
        .choose(&business.category, &mut rand::rng())
        .map(str::to_string);

    Ok(Json(LandingPage::new(business, review_text)))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRedirectQuery {
    pub bid: BusinessId,
}

/// Send the customer on to the external review site.
///
/// Does not count as a scan.
pub async fn redirect_review(
    State(state): State<AppState>,
    Query(query): Query<ReviewRedirectQuery>,
) -> Result<Redirect, AppError> {
    let business = state
        .store
        .get_business(&query.bid)
        .await?
        .ok_or(AppError::InvalidCode)?;

    Ok(Redirect::temporary(&business.external_review_url))
}
