//! Record store: durable keyed collections for businesses and scan events.
//!
//! This is the only layer touching persistence. Everything else goes through
//! the [`RecordStore`] trait, so the same service code runs against the JSON
//! file backend or the in-memory backend.
//!
//! # Guarantees every backend provides
//!
//! - Mutations of one collection are serialized, so concurrent appends are
//!   merged and never overwrite each other.
//! - Operations spanning both collections take the businesses lock before
//!   the scans lock, so recording a scan and deleting its business are
//!   ordered one way or the other, never interleaved.
//! - Readers only ever observe a fully written collection.
//! - Unparseable content is reported as [`StoreError::CorruptData`], never
//!   treated as an empty collection.

pub mod file;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::models::business::{Business, BusinessId};
use crate::models::review::ReviewCatalog;
use crate::models::scan::ScanEvent;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Shared handle used by handlers and services.
pub type SharedStore = Arc<dyn RecordStore>;

/// What happens to a deleted business's scan history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanRetention {
    /// Keep orphaned events as an audit trail
    #[default]
    Retain,
    /// Remove every event of the business together with it
    Purge,
}

/// Failure of a persisted collection.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Stored content exists but cannot be parsed.
    #[error("collection `{collection}` is corrupt: {source}")]
    CorruptData {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Storage could not be read or written.
    #[error("collection `{collection}` is unavailable: {source}")]
    Io {
        collection: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Keyed collection store for businesses, scan events and review texts.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All businesses in insertion order.
    async fn list_businesses(&self) -> Result<Vec<Business>, StoreError>;

    async fn get_business(&self, id: &BusinessId) -> Result<Option<Business>, StoreError>;

    /// Insert, or replace in place the record sharing the same id.
    async fn put_business(&self, business: Business) -> Result<(), StoreError>;

    /// Remove a business and, under `Purge`, its scan events in the same
    /// critical section. Returns whether a record existed; absence is not an
    /// error.
    async fn delete_business(
        &self,
        id: &BusinessId,
        retention: ScanRetention,
    ) -> Result<bool, StoreError>;

    /// Append one event at the end of the scan log if its business exists.
    ///
    /// The existence check and the append happen atomically with respect to
    /// `delete_business`. Returns the business, or `None` when nothing was
    /// appended.
    async fn record_scan(&self, scan: ScanEvent) -> Result<Option<Business>, StoreError>;

    /// Scan log in append order, optionally restricted to one business.
    async fn list_scans(
        &self,
        business_id: Option<&BusinessId>,
    ) -> Result<Vec<ScanEvent>, StoreError>;

    /// Review text lookup; read-only.
    async fn review_catalog(&self) -> Result<ReviewCatalog, StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Build the backend selected by configuration.
pub async fn open(config: &Config) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match config.store_backend {
        StoreBackend::File => Arc::new(JsonFileStore::open(&config.data_dir).await?),
        StoreBackend::Memory => {
            // Review texts are read-only seed data, so they still come from disk.
            let reviews = JsonFileStore::open(&config.data_dir)
                .await?
                .review_catalog()
                .await?;
            Arc::new(MemoryStore::with_reviews(reviews))
        }
    };
    tracing::info!(backend = store.backend_name(), "record store ready");
    Ok(store)
}
