//! Offline image compression.
//!
//! Runs the same transform the API applies in `compressed` media mode, so
//! operators can preview the result of a width/quality setting.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli compress photo.png photo.jpg --width 800 --quality 20
//! ```

use std::path::Path;

use catalog_api::media::{CompressError, CompressionSettings, compress_image};
use thiserror::Error;

/// Errors that can occur while compressing a file.
#[derive(Debug, Error)]
pub enum CompressCommandError {
    /// Input could not be read or output could not be written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The image could not be transformed.
    #[error(transparent)]
    Compress(#[from] CompressError),

    /// The blocking compression task panicked or was cancelled.
    #[error("compression task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Compress `input` and write the JPEG result to `output`.
///
/// Returns `(input_bytes, output_bytes)`.
///
/// # Errors
///
/// Returns `CompressCommandError` if either file can't be accessed or the
/// input isn't a decodable image.
pub async fn run(
    input: &Path,
    output: &Path,
    settings: CompressionSettings,
) -> Result<(usize, usize), CompressCommandError> {
    let bytes = tokio::fs::read(input).await.map_err(|source| CompressCommandError::Io {
        path: input.display().to_string(),
        source,
    })?;

    let input_len = bytes.len();
    let compressed = tokio::task::spawn_blocking(move || compress_image(&bytes, settings))
        .await??;

    tokio::fs::write(output, &compressed)
        .await
        .map_err(|source| CompressCommandError::Io {
            path: output.display().to_string(),
            source,
        })?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        input_bytes = input_len,
        output_bytes = compressed.len(),
        width = settings.target_width,
        quality = settings.quality,
        "Image compressed"
    );
    Ok((input_len, compressed.len()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    #[tokio::test]
    async fn test_compress_writes_narrower_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.png");
        let output = dir.path().join("wide.jpg");

        let mut png = Vec::new();
        RgbImage::from_pixel(1200, 600, Rgb([200, 40, 40]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        std::fs::write(&input, &png).unwrap();

        let settings = CompressionSettings::default();
        let (_, written) = run(&input, &output, settings).await.unwrap();

        let result = image::open(&output).unwrap();
        assert_eq!(result.width(), 800);
        assert_eq!(result.height(), 400);
        assert_eq!(
            written,
            usize::try_from(std::fs::metadata(&output).unwrap().len()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_compress_missing_input_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.png");

        let err = run(&input, &dir.path().join("out.jpg"), CompressionSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CompressCommandError::Io { .. }));
        assert!(err.to_string().contains("missing.png"));
    }

    #[tokio::test]
    async fn test_compress_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"not an image").unwrap();

        let err = run(&input, &dir.path().join("out.jpg"), CompressionSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CompressCommandError::Compress(_)));
    }

    #[tokio::test]
    async fn test_task_failure_is_not_reported_as_io() {
        let join_err = tokio::task::spawn_blocking(|| panic!("encoder crashed"))
            .await
            .unwrap_err();

        let err = CompressCommandError::from(join_err);

        assert!(matches!(err, CompressCommandError::Join(_)));
        assert!(err.to_string().starts_with("compression task failed"));
    }
}
