//! Product route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use catalog_core::ProductId;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::models::{Product, ProductInput, ProductView};
use crate::state::AppState;
use crate::upload::ProductForm;

/// Header carrying the number of products left out of a listing.
pub const RENDER_ERRORS_HEADER: &str = "x-render-errors";

/// Response body for a created product.
#[derive(Debug, Serialize)]
pub struct CreatedProduct {
    pub product: ProductView,
}

/// Plain confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Create a product.
///
/// POST /add/products
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedProduct>), AppError> {
    let form = ProductForm::read(multipart, state.media().config()).await?;

    let product = match insert_product(&state, &form).await {
        Ok(product) => product,
        Err(e) => {
            form.discard_stored_files().await;
            return Err(e);
        }
    };

    tracing::info!(
        product_id = %product.id,
        media_count = form.files.len(),
        mode = %state.media().mode(),
        "Product created"
    );

    let product = ProductView::render(&product, state.media())?;
    Ok((StatusCode::CREATED, Json(CreatedProduct { product })))
}

async fn insert_product(state: &AppState, form: &ProductForm) -> Result<Product, AppError> {
    let input = ProductInput::from_form(&form.fields)?;
    let media = state.media().ingest(&form.files).await?;
    Ok(state.store().insert(&input, &media).await?)
}

/// List all products.
///
/// GET /
///
/// A product whose stored media can't be rendered in the current mode is
/// left out; the number left out is reported in `x-render-errors`.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = state.store().list().await?;

    let mut views = Vec::with_capacity(products.len());
    let mut failed: usize = 0;
    for product in &products {
        match ProductView::render(product, state.media()) {
            Ok(view) => views.push(view),
            Err(e) => {
                failed += 1;
                tracing::warn!(product_id = %product.id, error = %e, "Skipping unrenderable product");
            }
        }
    }

    let mut response = Json(views).into_response();
    if failed > 0 {
        response
            .headers_mut()
            .insert(RENDER_ERRORS_HEADER, HeaderValue::from(failed));
    }
    Ok(response)
}

/// Replace a product.
///
/// PUT /{id}
///
/// Scalar fields are always replaced. Media is replaced only when the
/// request carries files.
#[instrument(skip(state, multipart), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<ProductView>, AppError> {
    let form = ProductForm::read(multipart, state.media().config()).await?;

    let product = match update_product(&state, id, &form).await {
        Ok(product) => product,
        Err(e) => {
            form.discard_stored_files().await;
            return Err(e);
        }
    };

    tracing::info!(
        media_replaced = !form.files.is_empty(),
        "Product updated"
    );

    Ok(Json(ProductView::render(&product, state.media())?))
}

async fn update_product(
    state: &AppState,
    id: ProductId,
    form: &ProductForm,
) -> Result<Product, AppError> {
    let input = ProductInput::from_form(&form.fields)?;
    let media = if form.files.is_empty() {
        None
    } else {
        Some(state.media().ingest(&form.files).await?)
    };

    state
        .store()
        .update(id, &input, media.as_ref())
        .await
        .map_err(|e| product_error(id, e))
}

/// Delete a product.
///
/// DELETE /{id}
#[instrument(skip(state), fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .store()
        .delete(id)
        .await
        .map_err(|e| product_error(id, e))?;

    tracing::info!("Product deleted");
    Ok(Json(MessageResponse {
        message: "Product deleted",
    }))
}

fn product_error(id: ProductId, err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(format!("product {id}")),
        other => other.into(),
    }
}
