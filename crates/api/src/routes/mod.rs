//! HTTP route handlers for the catalog API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (store reachable)
//!
//! # Products
//! POST   /add/products         - Create a product (multipart form)
//! GET    /                     - List all products with rendered media
//! PUT    /{id}                 - Replace a product (multipart form)
//! DELETE /{id}                 - Delete a product
//!
//! # Files (`path` media mode)
//! GET    /uploads/{file}       - Stored upload
//! ```

pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/add/products", post(products::create))
        .route("/", get(products::list))
        .route("/{id}", put(products::update).delete(products::delete))
}
