//! Catalog configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CATALOG_HOST` - Bind address (default: 127.0.0.1)
//! - `CATALOG_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)
//!
//! ## Optional (media)
//! - `MEDIA_MODE` - `raw`, `path` or `compressed` (default: raw)
//! - `MEDIA_FIELD_NAME` - Multipart field carrying files (default: media)
//! - `MEDIA_MAX_FILES` - Files accepted per request (default: 5)
//! - `MEDIA_MAX_FILE_BYTES` - Per-file size limit (default: 10485760)
//! - `MEDIA_UPLOAD_DIR` - Where `path` mode writes files (default: uploads)
//! - `MEDIA_TARGET_WIDTH` - Width images are shrunk to in `compressed` mode (default: 800)
//! - `MEDIA_QUALITY` - JPEG quality 1-100 in `compressed` mode (default: 20)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

use catalog_core::MediaMode;

use crate::media::MediaConfig;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog service configuration.
#[derive(Clone)]
pub struct CatalogConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Upload and media pipeline settings
    pub media: MediaConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("media", &self.media)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CATALOG_DATABASE_URL")?;
        let host = parse_env_or_default("CATALOG_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("CATALOG_PORT", "3000")?;
        let media = media_config_from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            media,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Read the `MEDIA_*` variables.
fn media_config_from_env() -> Result<MediaConfig, ConfigError> {
    let defaults = MediaConfig::default();

    let config = MediaConfig {
        mode: parse_env_or_default("MEDIA_MODE", &defaults.mode.to_string())?,
        field_name: get_env_or_default("MEDIA_FIELD_NAME", &defaults.field_name),
        max_files: parse_env_or_default("MEDIA_MAX_FILES", &defaults.max_files.to_string())?,
        max_file_bytes: parse_env_or_default(
            "MEDIA_MAX_FILE_BYTES",
            &defaults.max_file_bytes.to_string(),
        )?,
        upload_dir: get_optional_env("MEDIA_UPLOAD_DIR")
            .map_or(defaults.upload_dir, PathBuf::from),
        target_width: parse_env_or_default(
            "MEDIA_TARGET_WIDTH",
            &defaults.target_width.to_string(),
        )?,
        quality: parse_env_or_default("MEDIA_QUALITY", &defaults.quality.to_string())?,
    };

    validate_media_config(&config)?;
    Ok(config)
}

/// Reject settings that would make every upload fail.
fn validate_media_config(config: &MediaConfig) -> Result<(), ConfigError> {
    let invalid = |var: &str, reason: &str| {
        Err(ConfigError::InvalidEnvVar(var.to_string(), reason.to_string()))
    };

    if config.field_name.trim().is_empty() {
        return invalid("MEDIA_FIELD_NAME", "must not be empty");
    }
    if config.max_files == 0 {
        return invalid("MEDIA_MAX_FILES", "must be at least 1");
    }
    if config.max_file_bytes == 0 {
        return invalid("MEDIA_MAX_FILE_BYTES", "must be at least 1");
    }
    if config.target_width == 0 {
        return invalid("MEDIA_TARGET_WIDTH", "must be at least 1");
    }
    if !(1..=100).contains(&config.quality) {
        return invalid("MEDIA_QUALITY", "must be between 1 and 100");
    }
    if config.mode == MediaMode::Path && config.upload_dir.as_os_str().is_empty() {
        return invalid("MEDIA_UPLOAD_DIR", "must be set in path mode");
    }
    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., CATALOG_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
