//! In-memory product store.
//!
//! Behaves like [`PgProductStore`](super::PgProductStore) for the operations
//! handlers use. Intended for tests and local experiments; nothing survives a
//! restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use catalog_core::ProductId;

use super::{ProductStore, RepositoryError};
use crate::media::StoredMedia;
use crate::models::{Product, ProductInput};

#[derive(Debug, Default)]
struct Inner {
    last_id: i32,
    products: BTreeMap<ProductId, Product>,
}

/// Product store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    inner: RwLock<Inner>,
}

impl MemoryProductStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product exactly as given, bypassing input handling.
    ///
    /// Lets tests seed rows an older service version could have written.
    pub async fn insert_raw(&self, product: Product) {
        let mut inner = self.inner.write().await;
        inner.last_id = inner.last_id.max(product.id.as_i32());
        inner.products.insert(product.id, product);
    }

    /// Number of stored products.
    pub async fn len(&self) -> usize {
        self.inner.read().await.products.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Look up a single product.
    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.inner.read().await.products.get(&id).cloned()
    }
}

fn apply_input(product: &mut Product, input: &ProductInput) {
    product.title.clone_from(&input.title);
    product.price = input.price;
    product.stock_status = input.stock_status;
    product.stock_count = input.effective_stock_count();
    product.gender = input.gender;
    product.delivery_days = input.delivery_days;
    product.description.clone_from(&input.description);
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(
        &self,
        input: &ProductInput,
        media: &StoredMedia,
    ) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = ProductId::new(inner.last_id);
        let now = Utc::now();

        let product = Product {
            id,
            title: input.title.clone(),
            price: input.price,
            stock_status: input.stock_status,
            stock_count: input.effective_stock_count(),
            gender: input.gender,
            delivery_days: input.delivery_days,
            description: input.description.clone(),
            media: Some(media.clone()),
            likes: 0,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(id, product.clone());
        Ok(product)
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.inner.read().await.products.values().cloned().collect())
    }

    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        media: Option<&StoredMedia>,
    ) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        apply_input(product, input);
        if let Some(media) = media {
            product.media = Some(media.clone());
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.inner
            .write()
            .await
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
