//! Media ingestion and rendering.
//!
//! One pipeline serves all three storage strategies; the [`MediaMode`] in
//! [`MediaConfig`] selects which one a running service uses.
//!
//! ```text
//! upload layer ──► ingest ──► store ──► render ──► JSON
//!  (UploadedFile)  (StoredMedia)        (Vec<String>)
//! ```
//!
//! - `raw`: bytes pass through, rendered as base64
//! - `path`: the upload layer wrote files to disk, paths pass through both ways
//! - `compressed`: images are resized and re-encoded as JPEG, rendered as base64

pub mod compress;

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use catalog_core::MediaMode;
use futures::future::try_join_all;
use thiserror::Error;

use crate::upload::UploadedFile;

pub use compress::{CompressError, CompressionSettings, compress_image};

/// Default number of files accepted per request.
pub const DEFAULT_MAX_FILES: usize = 5;
/// Default per-file size limit (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
/// Allowance for scalar fields and multipart framing on top of the file budget.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Upload and media settings, passed explicitly into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    /// Storage strategy.
    pub mode: MediaMode,
    /// Multipart field that carries the files.
    pub field_name: String,
    /// Maximum number of files per request.
    pub max_files: usize,
    /// Maximum size of a single file in bytes.
    pub max_file_bytes: usize,
    /// Directory files are written to in `path` mode.
    pub upload_dir: PathBuf,
    /// Output width for `compressed` mode.
    pub target_width: u32,
    /// JPEG quality for `compressed` mode.
    pub quality: u8,
}

impl Default for MediaConfig {
    fn default() -> Self {
        let compression = CompressionSettings::default();
        Self {
            mode: MediaMode::default(),
            field_name: "media".to_string(),
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            upload_dir: PathBuf::from("uploads"),
            target_width: compression.target_width,
            quality: compression.quality,
        }
    }
}

impl MediaConfig {
    /// Default settings with the given mode.
    #[must_use]
    pub fn with_mode(mode: MediaMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Settings for the `compressed` transform.
    #[must_use]
    pub const fn compression(&self) -> CompressionSettings {
        CompressionSettings {
            target_width: self.target_width,
            quality: self.quality,
        }
    }

    /// Largest request body the upload routes accept.
    #[must_use]
    pub const fn request_body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_bytes)
            .saturating_add(FORM_OVERHEAD_BYTES)
    }
}

/// Media as persisted on a product record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredMedia {
    /// Binary blobs (`raw` and `compressed` modes).
    Blobs(Vec<Vec<u8>>),
    /// Path references (`path` mode).
    Paths(Vec<String>),
}

impl StoredMedia {
    /// Number of media entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Blobs(blobs) => blobs.len(),
            Self::Paths(paths) => paths.len(),
        }
    }

    /// Whether there are no media entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Blobs(_) => "blobs",
            Self::Paths(_) => "paths",
        }
    }
}

/// Failure turning uploads into stored media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// An upload is not a decodable image (`compressed` mode).
    #[error("media file {index} is not a supported image: {source}")]
    Decode {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding a decoded image failed.
    #[error("media file {index} could not be re-encoded: {source}")]
    Encode {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    /// The upload layer did not write a file that `path` mode expects on disk.
    #[error("media file {index} was not written to storage")]
    MissingPath { index: usize },

    /// A blocking compression task panicked or was cancelled.
    #[error("media processing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl MediaError {
    /// Whether the client sent something unusable, as opposed to a server fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Stored media that cannot be rendered under the configured mode.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("stored media is {found}, but the {mode} media mode expects {expected}")]
    Incompatible {
        mode: MediaMode,
        expected: &'static str,
        found: &'static str,
    },
}

/// The media ingestion pipeline.
#[derive(Debug, Clone)]
pub struct MediaPipeline {
    config: MediaConfig,
}

impl MediaPipeline {
    /// Create a pipeline from explicit settings.
    #[must_use]
    pub const fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// The settings this pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// The configured storage strategy.
    #[must_use]
    pub const fn mode(&self) -> MediaMode {
        self.config.mode
    }

    /// Turn accepted uploads into their stored representation.
    ///
    /// The result has one entry per upload, in upload order. An empty slice
    /// yields an empty list of the mode's kind. The upload layer enforces the
    /// file count; nothing is truncated here.
    ///
    /// # Errors
    ///
    /// In `compressed` mode, fails with `MediaError::Decode` if any upload is
    /// not an image; no partial result is returned. In `path` mode, fails with
    /// `MediaError::MissingPath` if an upload was never written to disk.
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<StoredMedia, MediaError> {
        match self.config.mode {
            MediaMode::Raw => Ok(StoredMedia::Blobs(
                files.iter().map(|file| file.bytes.to_vec()).collect(),
            )),
            MediaMode::Path => files
                .iter()
                .enumerate()
                .map(|(index, file)| {
                    file.stored_path
                        .as_ref()
                        .map(|path| path.to_string_lossy().into_owned())
                        .ok_or(MediaError::MissingPath { index })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(StoredMedia::Paths),
            MediaMode::Compressed => self.compress_all(files).await.map(StoredMedia::Blobs),
        }
    }

    /// Recompress every upload concurrently on the blocking pool, keeping input order.
    async fn compress_all(&self, files: &[UploadedFile]) -> Result<Vec<Vec<u8>>, MediaError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let settings = self.config.compression();
        let tasks = files.iter().enumerate().map(|(index, file)| {
            let bytes = file.bytes.clone();
            async move {
                match tokio::task::spawn_blocking(move || compress_image(&bytes, settings)).await {
                    Ok(result) => result.map_err(|e| e.at(index)),
                    Err(e) => Err(MediaError::Join(e)),
                }
            }
        });

        let blobs = try_join_all(tasks).await?;

        let before: usize = files.iter().map(|file| file.bytes.len()).sum();
        let after: usize = blobs.iter().map(Vec::len).sum();
        tracing::debug!(
            files = blobs.len(),
            bytes_in = before,
            bytes_out = after,
            "Compressed product media"
        );

        Ok(blobs)
    }

    /// Render stored media as transport-safe strings.
    ///
    /// Blob modes produce standard base64; `path` mode returns the paths unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Incompatible` if the record's media is missing or
    /// was stored under a different mode.
    pub fn render(&self, stored: Option<&StoredMedia>) -> Result<Vec<String>, RenderError> {
        let mode = self.config.mode;
        match (mode.stores_blobs(), stored) {
            (true, Some(StoredMedia::Blobs(blobs))) => {
                Ok(blobs.iter().map(|blob| STANDARD.encode(blob)).collect())
            }
            (false, Some(StoredMedia::Paths(paths))) => Ok(paths.clone()),
            (stores_blobs, other) => Err(RenderError::Incompatible {
                mode,
                expected: if stores_blobs { "blobs" } else { "paths" },
                found: other.map_or("missing", StoredMedia::kind),
            }),
        }
    }
}
