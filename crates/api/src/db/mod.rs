//! Product persistence.
//!
//! # Database: `catalog` schema
//!
//! ## Tables
//!
//! - `products` - Catalog entries. Media lives in `media` (blobs) or
//!   `media_paths` (path references), never both.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-cli -- migrate
//! ```
//!
//! Handlers talk to a [`ProductStore`] so the service can run against
//! [`PgProductStore`] in production and [`MemoryProductStore`] in tests.

pub mod memory;
pub mod products;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use catalog_core::ProductId;

use crate::media::StoredMedia;
use crate::models::{Product, ProductInput};

pub use memory::MemoryProductStore;
pub use products::PgProductStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Storage for catalog products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a new product and return it with its assigned id.
    async fn insert(
        &self,
        input: &ProductInput,
        media: &StoredMedia,
    ) -> Result<Product, RepositoryError>;

    /// All products, oldest first.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Replace a product's scalar fields, and its media when `media` is given.
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        media: Option<&StoredMedia>,
    ) -> Result<Product, RepositoryError>;

    /// Remove a product.
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
