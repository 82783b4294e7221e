//! Core types for the product catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod media;
pub mod price;
pub mod status;

pub use id::*;
pub use media::{MediaMode, ParseMediaModeError};
pub use price::{Price, PriceError};
pub use status::*;
