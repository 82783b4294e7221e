//! Multipart upload handling.
//!
//! Reads a product form into scalar fields plus the files posted under the
//! configured media field. This layer owns the upload limits: it rejects a
//! request that carries more than `max_files` files or any file larger than
//! `max_file_bytes`. In `path` mode it also writes each file to the upload
//! directory as it arrives, so the media pipeline only has to collect paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use catalog_core::MediaMode;
use thiserror::Error;
use uuid::Uuid;

use crate::media::MediaConfig;

/// Errors raised while reading an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The body is not valid multipart, or the body limit was hit.
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// More files than the configured cap.
    #[error("too many files in `{field}` (at most {limit} allowed)")]
    TooManyFiles { field: String, limit: usize },

    /// A single file is over the size limit.
    #[error("file {file_name:?} is larger than {limit} bytes")]
    FileTooLarge { file_name: String, limit: usize },

    /// A file was posted under a field other than the media field.
    #[error("unexpected file field `{0}`")]
    UnexpectedField(String),

    /// Writing the file to the upload directory failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the client sent something unusable, as opposed to a server fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// A file accepted by the upload layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Raw file contents.
    pub bytes: Bytes,
    /// Where the file was written (`path` mode only).
    pub stored_path: Option<PathBuf>,
}

impl UploadedFile {
    /// No file name and no contents.
    fn is_blank(&self) -> bool {
        self.file_name.as_deref().is_none_or(str::is_empty) && self.bytes.is_empty()
    }
}

/// A parsed product form.
#[derive(Debug, Default)]
pub struct ProductForm {
    /// Scalar text fields by name. A repeated field keeps its last value.
    pub fields: HashMap<String, String>,
    /// Files posted under the media field, in arrival order.
    pub files: Vec<UploadedFile>,
}

impl ProductForm {
    /// Read the whole multipart body.
    ///
    /// If reading fails part-way, files already written to disk are removed
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the body is malformed, breaks a limit, or a
    /// file cannot be written.
    pub async fn read(mut multipart: Multipart, config: &MediaConfig) -> Result<Self, UploadError> {
        let mut form = Self::default();
        if let Err(e) = form.read_fields(&mut multipart, config).await {
            form.discard_stored_files().await;
            return Err(e);
        }
        Ok(form)
    }

    async fn read_fields(
        &mut self,
        multipart: &mut Multipart,
        config: &MediaConfig,
    ) -> Result<(), UploadError> {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == config.field_name {
                let mut file = read_file(field, config.max_file_bytes).await?;
                // An untouched file input posts an unnamed, empty part
                if file.is_blank() {
                    continue;
                }
                if self.files.len() >= config.max_files {
                    return Err(UploadError::TooManyFiles {
                        field: name,
                        limit: config.max_files,
                    });
                }
                if config.mode == MediaMode::Path {
                    file.stored_path = Some(store_file(&file, &config.upload_dir).await?);
                }
                self.files.push(file);
            } else if field.file_name().is_some() {
                return Err(UploadError::UnexpectedField(name));
            } else {
                let value = field.text().await?;
                self.fields.insert(name, value);
            }
        }
        Ok(())
    }

    /// Remove files this form wrote to disk.
    ///
    /// Used when the request fails after the upload was read. Failures are
    /// logged and otherwise ignored.
    pub async fn discard_stored_files(&self) {
        for path in self.files.iter().filter_map(|f| f.stored_path.as_ref()) {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove orphaned upload");
            }
        }
    }
}

async fn read_file(mut field: Field<'_>, limit: usize) -> Result<UploadedFile, UploadError> {
    let file_name = field.file_name().map(str::to_string);

    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(UploadError::FileTooLarge {
                file_name: file_name.unwrap_or_default(),
                limit,
            });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        bytes: Bytes::from(buf),
        stored_path: None,
    })
}

async fn store_file(file: &UploadedFile, dir: &Path) -> Result<PathBuf, UploadError> {
    tokio::fs::create_dir_all(dir).await?;

    let name = format!(
        "{}-{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(file.file_name.as_deref())
    );
    let path = dir.join(name);
    tokio::fs::write(&path, &file.bytes).await?;

    tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "Stored upload");
    Ok(path)
}

/// Reduce a client file name to a safe final path component.
fn sanitize_file_name(name: Option<&str>) -> String {
    let base = name
        .map(|n| n.rsplit(['/', '\\']).next().unwrap_or(n))
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
