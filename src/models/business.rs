//! Business data models and API request/response types.
//!
//! This module defines:
//! - `BusinessId`: opaque short identifier shared by records, QR artifacts and scans
//! - `Business`: persisted business record
//! - `CreateBusinessRequest`: registration body, validated before any write
//! - `BusinessResponse`: record plus the links derived from its id

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

const MAX_NAME_LEN: usize = 200;

/// Opaque short identifier of a business.
///
/// Eight lowercase hex characters taken from a v4 UUID. Immutable once
/// assigned; used as the key of the QR artifact and as the foreign key of
/// every scan event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(String);

impl BusinessId {
    /// Draw a fresh random id.
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id can safely name a file in the artifact directory.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl From<String> for BusinessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BusinessId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a business record from the `businesses` collection.
///
/// Field names on disk follow the long-standing data file format, so
/// `external_review_url` is stored as `google_review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,

    pub name: String,

    /// Review-text category, e.g. "restaurant". Unknown categories fall back to "general".
    #[serde(default = "default_category")]
    pub category: String,

    /// Email of the owning account; the only ownership link.
    pub owner_email: String,

    /// Where customers are sent to leave their review.
    #[serde(rename = "google_review")]
    pub external_review_url: String,

    pub status: String,
}

fn default_category() -> String {
    "general".to_string()
}

/// Request body for registering a business.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Blue Door Cafe",
///   "category": "restaurant",
///   "external_review_url": "https://g.page/r/blue-door/review",
///   "status": "active"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBusinessRequest {
    pub name: String,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(alias = "google_review")]
    pub external_review_url: String,

    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_string()
}

impl CreateBusinessRequest {
    /// Check every field and build the record that would be stored.
    ///
    /// Nothing is persisted here; a rejected request leaves no trace.
    pub fn into_business(self, id: BusinessId, owner_email: &str) -> Result<Business, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "name exceeds {MAX_NAME_LEN} characters"
            )));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(AppError::InvalidInput(
                "category must not be empty".to_string(),
            ));
        }

        let status = self.status.trim();
        if status.is_empty() {
            return Err(AppError::InvalidInput("status must not be empty".to_string()));
        }

        let review_url = self.external_review_url.trim();
        let parsed = url::Url::parse(review_url)
            .map_err(|_| AppError::InvalidInput("external_review_url is not a valid URL".to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::InvalidInput(
                "external_review_url must use http or https".to_string(),
            ));
        }

        Ok(Business {
            id,
            name: name.to_string(),
            category: category.to_string(),
            owner_email: owner_email.to_string(),
            external_review_url: review_url.to_string(),
            status: status.to_string(),
        })
    }
}

/// Response body for business endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "3f9c2a1b",
///   "name": "Blue Door Cafe",
///   "category": "restaurant",
///   "owner_email": "owner@example.com",
///   "external_review_url": "https://g.page/r/blue-door/review",
///   "status": "active",
///   "qr_url": "/api/businesses/3f9c2a1b/qr",
///   "landing_path": "/r/3f9c2a1b"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct BusinessResponse {
    pub id: BusinessId,
    pub name: String,
    pub category: String,
    pub owner_email: String,
    pub external_review_url: String,
    pub status: String,
    pub qr_url: String,
    pub landing_path: String,
}

impl From<Business> for BusinessResponse {
    fn from(business: Business) -> Self {
        Self {
            qr_url: format!("/api/businesses/{}/qr", business.id),
            landing_path: format!("/r/{}", business.id),
            id: business.id,
            name: business.name,
            category: business.category,
            owner_email: business.owner_email,
            external_review_url: business.external_review_url,
            status: business.status,
        }
    }
}
