//! Status enums for catalog products.
//!
//! The wire spellings (`"In Stock"`, `"Out-of-stock"`, ...) are the ones
//! clients already send, so serde, `Display`, `FromStr` and the Postgres
//! enum labels all share them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a form value does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Availability of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "catalog.stock_status"))]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "In Stock"))]
    InStock,
    #[serde(rename = "Out-of-stock")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "Out-of-stock"))]
    OutOfStock,
    #[serde(rename = "Getting Ready")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "Getting Ready"))]
    GettingReady,
}

impl StockStatus {
    /// Whether a stock count is meaningful for this status.
    ///
    /// Only `In Stock` products carry a `stockCount`; for every other status
    /// the submitted count is discarded.
    #[must_use]
    pub const fn tracks_count(self) -> bool {
        matches!(self, Self::InStock)
    }

    /// The label used on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::OutOfStock => "Out-of-stock",
            Self::GettingReady => "Getting Ready",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StockStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In Stock" => Ok(Self::InStock),
            "Out-of-stock" => Ok(Self::OutOfStock),
            "Getting Ready" => Ok(Self::GettingReady),
            _ => Err(ParseStatusError::new("stock status", s)),
        }
    }
}

/// Target audience of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "catalog.gender"))]
pub enum Gender {
    Male,
    Female,
    Kids,
}

impl Gender {
    /// The label used on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Kids => "Kids",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            "Kids" => Ok(Self::Kids),
            _ => Err(ParseStatusError::new("gender", s)),
        }
    }
}
