//! Catalog API - product CRUD over HTTP with media ingestion.
//!
//! # Architecture
//!
//! - Axum web framework, multipart forms in, JSON out
//! - `PostgreSQL` via sqlx behind the [`db::ProductStore`] trait
//! - [`media::MediaPipeline`] stores uploads as raw bytes, file paths, or
//!   recompressed JPEGs depending on [`catalog_core::MediaMode`]
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around
//! [`app::router`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod routes;
pub mod state;
pub mod upload;

pub use app::router;
pub use state::AppState;
