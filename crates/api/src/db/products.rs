//! `PostgreSQL` product repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use catalog_core::{Gender, Price, ProductId, StockStatus};

use super::{ProductStore, RepositoryError};
use crate::media::StoredMedia;
use crate::models::{Comment, Product, ProductInput};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` product queries.
///
/// Array elements decode as `Option` so a stray `NULL` inside `media` or
/// `media_paths` surfaces as a conversion error instead of a decode failure
/// for the whole result set.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    price: Price,
    stock_status: StockStatus,
    stock_count: Option<i32>,
    gender: Gender,
    delivery_days: i32,
    description: Option<String>,
    media: Option<Vec<Option<Vec<u8>>>>,
    media_paths: Option<Vec<Option<String>>>,
    likes: i32,
    comments: Json<Vec<Comment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Take the media columns out of the row.
    fn take_media(&mut self) -> Result<Option<StoredMedia>, RepositoryError> {
        let id = self.id;
        let null_element =
            || RepositoryError::DataCorruption(format!("product {id} has a NULL media element"));

        match (self.media.take(), self.media_paths.take()) {
            (Some(blobs), None) => blobs
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .map(|b| Some(StoredMedia::Blobs(b)))
                .ok_or_else(null_element),
            (None, Some(paths)) => paths
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .map(|p| Some(StoredMedia::Paths(p)))
                .ok_or_else(null_element),
            (None, None) => Ok(None),
            (Some(_), Some(_)) => Err(RepositoryError::DataCorruption(format!(
                "product {id} has both blob and path media"
            ))),
        }
    }

    fn into_product(self, media: Option<StoredMedia>) -> Product {
        Product {
            id: self.id,
            title: self.title,
            price: self.price,
            stock_status: self.stock_status,
            stock_count: self.stock_count,
            gender: self.gender,
            delivery_days: self.delivery_days,
            description: self.description,
            media,
            likes: self.likes,
            comments: self.comments.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Convert a row for listing.
    ///
    /// Unreadable media is dropped, so the product fails its own render
    /// instead of the whole listing.
    fn into_listed_product(mut self) -> Product {
        let media = self.take_media().unwrap_or_else(|e| {
            tracing::warn!(product_id = %self.id, error = %e, "Unreadable product media");
            None
        });
        self.into_product(media)
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(mut row: ProductRow) -> Result<Self, Self::Error> {
        let media = row.take_media()?;
        Ok(row.into_product(media))
    }
}

/// Split stored media into the `(media, media_paths)` column pair.
fn media_columns(media: &StoredMedia) -> (Option<&[Vec<u8>]>, Option<&[String]>) {
    match media {
        StoredMedia::Blobs(blobs) => (Some(blobs), None),
        StoredMedia::Paths(paths) => (None, Some(paths)),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(
        &self,
        input: &ProductInput,
        media: &StoredMedia,
    ) -> Result<Product, RepositoryError> {
        let (blobs, paths) = media_columns(media);

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO catalog.products
                (title, price, stock_status, stock_count, gender, delivery_days,
                 description, media, media_paths)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, title, price, stock_status, stock_count, gender, delivery_days,
                      description, media, media_paths, likes, comments, created_at, updated_at
            ",
        )
        .bind(&input.title)
        .bind(input.price)
        .bind(input.stock_status)
        .bind(input.effective_stock_count())
        .bind(input.gender)
        .bind(input.delivery_days)
        .bind(input.description.as_deref())
        .bind(blobs)
        .bind(paths)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, price, stock_status, stock_count, gender, delivery_days,
                   description, media, media_paths, likes, comments, created_at, updated_at
            FROM catalog.products
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_listed_product).collect())
    }

    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        media: Option<&StoredMedia>,
    ) -> Result<Product, RepositoryError> {
        let (blobs, paths) = media.map_or((None, None), media_columns);

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE catalog.products
            SET title = $2,
                price = $3,
                stock_status = $4,
                stock_count = $5,
                gender = $6,
                delivery_days = $7,
                description = $8,
                media = CASE WHEN $9 THEN $10 ELSE media END,
                media_paths = CASE WHEN $9 THEN $11 ELSE media_paths END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, price, stock_status, stock_count, gender, delivery_days,
                      description, media, media_paths, likes, comments, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(input.price)
        .bind(input.stock_status)
        .bind(input.effective_stock_count())
        .bind(input.gender)
        .bind(input.delivery_days)
        .bind(input.description.as_deref())
        .bind(media.is_some())
        .bind(blobs)
        .bind(paths)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
