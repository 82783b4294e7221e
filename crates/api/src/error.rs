//! Unified error handling for the catalog API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::media::{MediaError, RenderError};
use crate::models::ValidationError;
use crate::upload::UploadError;

/// Application-level error type for request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Submitted form fields are missing or invalid.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Upload was rejected or could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Media could not be ingested.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Stored media could not be rendered.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource".to_string()),
            other => Self::Database(other),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upload(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Media(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_)
            | Self::Upload(_)
            | Self::Media(_)
            | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn summary(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid product data",
            Self::Upload(_) => "Upload rejected",
            Self::Media(_) => "Media could not be processed",
            Self::NotFound(_) => "Product not found",
            Self::Database(_) | Self::Render(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Catalog request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        // Don't expose internal error details to clients
        let error = if status.is_server_error() {
            None
        } else {
            Some(match &self {
                Self::Validation(e) => e.to_string(),
                Self::Upload(e) => e.to_string(),
                Self::Media(e) => e.to_string(),
                other => other.to_string(),
            })
        };

        let body = ErrorBody {
            message: self.summary(),
            error,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::from(ValidationError::Missing("title"));
        assert_eq!(
            err.to_string(),
            "Validation error: missing required field `title`"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ValidationError::Missing("price").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                UploadError::FileTooLarge {
                    file_name: "big.jpg".to_string(),
                    limit: 10,
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(UploadError::Io(std::io::Error::other("disk full")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(MediaError::MissingPath { index: 0 }.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = AppError::from(RepositoryError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = AppError::from(RepositoryError::DataCorruption("bad".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response =
            AppError::from(RepositoryError::DataCorruption("secret detail".to_string()))
                .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_client_errors_include_details() {
        let response = AppError::from(ValidationError::Missing("gender")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["message"], "Invalid product data");
        assert_eq!(body["error"], "missing required field `gender`");
    }
}
