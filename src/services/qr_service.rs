//! QR provisioner - issues and retires one PNG artifact per business.
//!
//! The encoded URL is derived only from the base URL and the business id, so
//! issuing twice for the same inputs produces the same code. Artifacts live at
//! `<qr_dir>/<business_id>.png` and are keyed by id alone: re-issuing
//! overwrites.
//!
//! Every write or removal happens through an [`ArtifactLock`], the per-id
//! mutex guard. Callers that must keep the artifact in step with the business
//! record hold the lock across their record check or update.
//!
//! # Scannability
//!
//! Codes are encoded at error-correction level H (about 30% of the symbol may
//! be damaged). The optional centre logo is capped at [`MAX_LOGO_RATIO`] of the
//! edge length, i.e. at most 1% of the area, which stays well inside that
//! budget even after the quiet zone is discounted.

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use image::{DynamicImage, ImageFormat, Luma, RgbaImage, imageops};
use qrcode::{EcLevel, QrCode};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::business::BusinessId;

/// Error-correction level every artifact is encoded with.
pub const ERROR_CORRECTION: EcLevel = EcLevel::H;

/// Largest logo edge, relative to the QR edge, that level H tolerates.
pub const MAX_LOGO_RATIO: f32 = 0.10;

/// Smallest rendered edge that keeps modules readable by phone cameras.
pub const MIN_SIZE_PX: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("failed to encode QR code: {0}")]
    Encode(String),

    #[error("failed to render QR image: {0}")]
    Image(#[from] image::ImageError),

    #[error("artifact I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("business id `{0}` cannot name an artifact")]
    InvalidId(BusinessId),

    #[error("invalid QR settings: {0}")]
    InvalidSettings(String),

    #[error("rendering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Rendering parameters.
#[derive(Debug, Clone)]
pub struct QrSettings {
    /// Minimum edge length of the PNG, quiet zone included
    pub size_px: u32,

    /// Logo pasted at the centre; skipped when the file does not exist
    pub logo_path: Option<PathBuf>,

    /// Logo edge divided by QR edge
    pub logo_ratio: f32,
}

impl QrSettings {
    /// Error-correction level and logo size must be chosen together; reject
    /// any ratio that would eat into the level-H recovery budget.
    pub fn validate(&self) -> Result<(), QrError> {
        if self.size_px < MIN_SIZE_PX {
            return Err(QrError::InvalidSettings(format!(
                "size must be at least {MIN_SIZE_PX}px"
            )));
        }
        if !(self.logo_ratio > 0.0 && self.logo_ratio <= MAX_LOGO_RATIO) {
            return Err(QrError::InvalidSettings(format!(
                "logo ratio {} outside (0, {MAX_LOGO_RATIO}]",
                self.logo_ratio
            )));
        }
        Ok(())
    }
}

/// Where an issued artifact lives and what it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub business_id: BusinessId,
    pub path: PathBuf,
    pub target_url: String,
}

/// URL a printed code sends customers to: `<base>/r/<id>`.
pub fn target_url(base_url: &str, id: &BusinessId) -> String {
    format!("{}/r/{}", base_url.trim_end_matches('/'), id)
}

pub struct QrProvisioner {
    dir: PathBuf,
    settings: QrSettings,
    logo: Option<Arc<RgbaImage>>,
    // Entries are never evicted so that every holder of a given id's lock
    // shares the same mutex.
    locks: DashMap<BusinessId, Arc<Mutex<()>>>,
}

impl QrProvisioner {
    /// Validate settings, create the artifact directory and load the logo.
    pub async fn new(dir: impl Into<PathBuf>, settings: QrSettings) -> Result<Self, QrError> {
        settings.validate()?;

        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| QrError::Io {
                path: dir.clone(),
                source,
            })?;

        let logo = match settings.logo_path.clone() {
            Some(path) => load_logo(path).await?,
            None => None,
        };

        Ok(Self {
            dir,
            settings,
            logo,
            locks: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, id: &BusinessId) -> Result<PathBuf, QrError> {
        if !id.is_path_safe() {
            return Err(QrError::InvalidId(id.clone()));
        }
        Ok(self.dir.join(format!("{id}.png")))
    }

    /// Take exclusive hold of `id`'s artifact. Different ids never contend.
    pub async fn lock(&self, id: &BusinessId) -> Result<ArtifactLock<'_>, QrError> {
        if !id.is_path_safe() {
            return Err(QrError::InvalidId(id.clone()));
        }
        let mutex = self.locks.entry(id.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;

        Ok(ArtifactLock {
            qr: self,
            id: id.clone(),
            _guard: guard,
        })
    }

    /// PNG bytes of the artifact, or `None` when no file exists.
    pub async fn read(&self, id: &BusinessId) -> Result<Option<Vec<u8>>, QrError> {
        let path = self.artifact_path(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(QrError::Io { path, source }),
        }
    }

    async fn remove_artifact(&self, id: &BusinessId) -> Result<(), QrError> {
        let path = self.artifact_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(business_id = %id, "retired QR artifact");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(QrError::Io { path, source }),
        }
    }

    /// Caller must hold the id's lock.
    async fn write_artifact(&self, id: &BusinessId, base_url: &str) -> Result<ArtifactRef, QrError> {
        let path = self.artifact_path(id)?;
        let url = target_url(base_url, id);

        let png = {
            let url = url.clone();
            let size_px = self.settings.size_px;
            let ratio = self.settings.logo_ratio;
            let logo = self.logo.clone();
            tokio::task::spawn_blocking(move || render_png(&url, size_px, logo.as_deref(), ratio))
                .await??
        };

        write_atomic(&path, &png).await?;
        tracing::info!(business_id = %id, target = %url, "issued QR artifact");

        Ok(ArtifactRef {
            business_id: id.clone(),
            path,
            target_url: url,
        })
    }
}

/// Held lock on one business's artifact; released on drop.
pub struct ArtifactLock<'a> {
    qr: &'a QrProvisioner,
    id: BusinessId,
    _guard: OwnedMutexGuard<()>,
}

impl ArtifactLock<'_> {
    /// Render and store the artifact, replacing any previous one.
    pub async fn issue(&self, base_url: &str) -> Result<ArtifactRef, QrError> {
        self.qr.write_artifact(&self.id, base_url).await
    }

    /// Return the existing artifact, regenerating it if the file went missing.
    pub async fn ensure(&self, base_url: &str) -> Result<ArtifactRef, QrError> {
        let path = self.qr.artifact_path(&self.id)?;
        let present = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| QrError::Io {
                path: path.clone(),
                source,
            })?;
        if present {
            return Ok(ArtifactRef {
                business_id: self.id.clone(),
                path,
                target_url: target_url(base_url, &self.id),
            });
        }

        tracing::warn!(business_id = %self.id, "QR artifact missing, regenerating");
        self.qr.write_artifact(&self.id, base_url).await
    }

    /// Delete the artifact. A missing file is not an error.
    pub async fn retire(&self) -> Result<(), QrError> {
        self.qr.remove_artifact(&self.id).await
    }

    pub async fn read(&self) -> Result<Option<Vec<u8>>, QrError> {
        self.qr.read(&self.id).await
    }
}

async fn load_logo(path: PathBuf) -> Result<Option<Arc<RgbaImage>>, QrError> {
    let present = tokio::fs::try_exists(&path)
        .await
        .map_err(|source| QrError::Io {
            path: path.clone(),
            source,
        })?;
    if !present {
        tracing::info!(path = %path.display(), "no QR logo found, rendering plain codes");
        return Ok(None);
    }

    let image = tokio::task::spawn_blocking(move || image::open(path)).await??;
    Ok(Some(Arc::new(image.to_rgba8())))
}

/// Encode `target_url` at level H and render it as a PNG.
pub fn render_png(
    target_url: &str,
    size_px: u32,
    logo: Option<&RgbaImage>,
    logo_ratio: f32,
) -> Result<Vec<u8>, QrError> {
    let code = QrCode::with_error_correction_level(target_url.as_bytes(), ERROR_CORRECTION)
        .map_err(|e| QrError::Encode(e.to_string()))?;

    let modules = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(size_px, size_px)
        .build();
    let mut canvas = DynamicImage::ImageLuma8(modules).to_rgba8();

    if let Some(logo) = logo {
        overlay_logo(&mut canvas, logo, logo_ratio);
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn overlay_logo(canvas: &mut RgbaImage, logo: &RgbaImage, ratio: f32) {
    let edge = canvas.width().min(canvas.height());
    let side = ((edge as f32) * ratio).round().max(1.0) as u32;
    let resized = imageops::resize(logo, side, side, imageops::FilterType::Lanczos3);

    let x = i64::from((canvas.width() - side) / 2);
    let y = i64::from((canvas.height() - side) / 2);
    imageops::overlay(canvas, &resized, x, y);
}

/// Write to a sibling temp file, fsync, then rename over the destination.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), QrError> {
    let tmp_path = path.with_extension(format!("png.tmp.{}", Uuid::new_v4().simple()));

    let result = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(source) = result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(QrError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
