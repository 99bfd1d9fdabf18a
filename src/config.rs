//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use std::path::PathBuf;

use serde::Deserialize;

use crate::services::qr_service::QrSettings;

/// Which `RecordStore` backend to construct at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON collections under `DATA_DIR`
    #[default]
    File,
    /// Volatile in-process collections
    Memory,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATA_DIR` (optional): collection directory, defaults to `data`
/// - `QR_DIR` (optional): QR artifact directory, defaults to `static/qr_codes`
/// - `STORE_BACKEND` (optional): `file` or `memory`, defaults to `file`
/// - `PUBLIC_BASE_URL` (optional): base URL encoded into QR codes
/// - `QR_SIZE_PX` (optional): minimum QR edge length in pixels, defaults to 400
/// - `QR_LOGO_PATH` (optional): centre logo, defaults to `static/logo.png`
/// - `QR_LOGO_RATIO` (optional): logo edge relative to QR edge, defaults to 0.09
/// - `PURGE_SCANS_ON_DELETE` (optional): purge scan history with the business
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_qr_dir")]
    pub qr_dir: PathBuf,

    #[serde(default)]
    pub store_backend: StoreBackend,

    /// When unset the base URL is derived from each registration request.
    #[serde(default)]
    pub public_base_url: Option<String>,

    #[serde(default = "default_qr_size")]
    pub qr_size_px: u32,

    #[serde(default = "default_logo_path")]
    pub qr_logo_path: Option<PathBuf>,

    #[serde(default = "default_logo_ratio")]
    pub qr_logo_ratio: f32,

    #[serde(default)]
    pub purge_scans_on_delete: bool,
}

/// Configuration could not be loaded or failed validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_qr_dir() -> PathBuf {
    PathBuf::from("static/qr_codes")
}

fn default_qr_size() -> u32 {
    400
}

fn default_logo_path() -> Option<PathBuf> {
    Some(PathBuf::from("static/logo.png"))
}

fn default_logo_ratio() -> f32 {
    0.09
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: default_port(),
            data_dir: default_data_dir(),
            qr_dir: default_qr_dir(),
            store_backend: StoreBackend::default(),
            public_base_url: None,
            qr_size_px: default_qr_size(),
            qr_logo_path: default_logo_path(),
            qr_logo_ratio: default_logo_ratio(),
            purge_scans_on_delete: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - `PUBLIC_BASE_URL` is not an absolute http(s) URL
    /// - `QR_LOGO_RATIO` is outside `(0, 0.10]`
    /// - `QR_SIZE_PX` is below 64 pixels
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.public_base_url {
            let parsed = url::Url::parse(base)
                .map_err(|e| ConfigError::Invalid(format!("PUBLIC_BASE_URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(
                    "PUBLIC_BASE_URL must use http or https".to_string(),
                ));
            }
        }

        self.qr_settings()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Rendering parameters handed to the QR provisioner.
    pub fn qr_settings(&self) -> QrSettings {
        QrSettings {
            size_px: self.qr_size_px,
            logo_path: self.qr_logo_path.clone(),
            logo_ratio: self.qr_logo_ratio,
        }
    }

    /// Configured base URL without a trailing slash.
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
    }
}
