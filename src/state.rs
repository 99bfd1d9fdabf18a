//! Shared application state handed to every handler via `State`.

use std::sync::Arc;

use crate::{
    config::Config, services::qr_service::QrProvisioner,
    store::{ScanRetention, SharedStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub qr: Arc<QrProvisioner>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: SharedStore, qr: QrProvisioner, config: Config) -> Self {
        Self {
            store,
            qr: Arc::new(qr),
            config: Arc::new(config),
        }
    }

    /// Retention policy for scans of deleted businesses.
    pub fn scan_retention(&self) -> ScanRetention {
        if self.config.purge_scans_on_delete {
            ScanRetention::Purge
        } else {
            ScanRetention::Retain
        }
    }
}
