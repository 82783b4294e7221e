//! Product domain models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use catalog_core::{Gender, Price, ProductId, StockStatus};

use crate::media::{MediaPipeline, RenderError, StoredMedia};

/// A submitted form field is missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A comment left on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub user: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

/// Validated scalar fields of an add or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub title: String,
    pub price: Price,
    pub stock_status: StockStatus,
    pub stock_count: Option<i32>,
    pub gender: Gender,
    pub delivery_days: i32,
    pub description: Option<String>,
}

impl ProductInput {
    /// Validate raw form fields.
    ///
    /// `stockCount` is only read when `stockStatus` is `In Stock`; for any
    /// other status it is dropped without being looked at.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a missing required field or a value that
    /// does not parse.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let title = required(fields, "title")?.to_string();
        let price = required(fields, "price")?
            .parse::<Price>()
            .map_err(|e| invalid("price", e))?;
        let stock_status = required(fields, "stockStatus")?
            .parse::<StockStatus>()
            .map_err(|e| invalid("stockStatus", e))?;
        let gender = required(fields, "gender")?
            .parse::<Gender>()
            .map_err(|e| invalid("gender", e))?;
        let delivery_days = parse_count(required(fields, "deliveryDays")?, "deliveryDays")?;

        let stock_count = if stock_status.tracks_count() {
            optional(fields, "stockCount")
                .map(|v| parse_count(v, "stockCount"))
                .transpose()?
        } else {
            None
        };

        Ok(Self {
            title,
            price,
            stock_status,
            stock_count,
            gender,
            delivery_days,
            description: optional(fields, "description").map(str::to_string),
        })
    }

    /// The stock count to persist: present only for `In Stock` products.
    #[must_use]
    pub fn effective_stock_count(&self) -> Option<i32> {
        self.stock_count.filter(|_| self.stock_status.tracks_count())
    }
}

/// Trimmed, non-empty value of a form field.
fn optional<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn required<'a>(
    fields: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    optional(fields, name).ok_or(ValidationError::Missing(name))
}

fn invalid(field: &'static str, err: impl std::fmt::Display) -> ValidationError {
    ValidationError::Invalid {
        field,
        reason: err.to_string(),
    }
}

fn parse_count(value: &str, field: &'static str) -> Result<i32, ValidationError> {
    let n = value.parse::<i32>().map_err(|e| invalid(field, e))?;
    if n < 0 {
        return Err(invalid(field, "must not be negative"));
    }
    Ok(n)
}

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub stock_status: StockStatus,
    pub stock_count: Option<i32>,
    pub gender: Gender,
    pub delivery_days: i32,
    pub description: Option<String>,
    /// `None` for legacy rows written without media.
    pub media: Option<StoredMedia>,
    pub likes: i32,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product as returned over HTTP, with media rendered to strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub stock_status: StockStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_count: Option<i32>,
    pub gender: Gender,
    pub delivery_days: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub media: Vec<String>,
    pub likes: i32,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    /// Render a stored product for the configured media mode.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the product's media cannot be rendered in this mode.
    pub fn render(product: &Product, media: &MediaPipeline) -> Result<Self, RenderError> {
        Ok(Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            stock_status: product.stock_status,
            stock_count: product
                .stock_count
                .filter(|_| product.stock_status.tracks_count()),
            gender: product.gender,
            delivery_days: product.delivery_days,
            description: product.description.clone(),
            media: media.render(product.media.as_ref())?,
            likes: product.likes,
            comments: product.comments.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        })
    }
}
