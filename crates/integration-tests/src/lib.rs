//! Integration test support for the catalog API.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p catalog-integration-tests
//!
//! # Live-server tests against a running catalog-api
//! CATALOG_BASE_URL=http://localhost:3000 cargo test -p catalog-integration-tests -- --ignored
//! ```
//!
//! In-process tests drive [`catalog_api::router`] with
//! `tower::ServiceExt::oneshot`, backed by a
//! [`MemoryProductStore`](catalog_api::db::MemoryProductStore).

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use catalog_api::db::{MemoryProductStore, ProductStore};
use catalog_api::media::{MediaConfig, MediaPipeline};
use catalog_api::{AppState, router};
use catalog_core::MediaMode;

/// Boundary used by [`MultipartForm`].
pub const BOUNDARY: &str = "catalog-test-boundary-7MA4YWxkTrZu0gW";

/// A catalog router wired to an in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryProductStore>,
    router: Router,
    upload_dir: TempDir,
}

impl TestApp {
    /// App with default media settings in the given mode.
    pub fn new(mode: MediaMode) -> Self {
        Self::with_config(MediaConfig::with_mode(mode))
    }

    /// App with custom media settings. `upload_dir` is replaced with a
    /// temporary directory owned by the app.
    pub fn with_config(mut config: MediaConfig) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        config.upload_dir = upload_dir.path().to_path_buf();

        let store = Arc::new(MemoryProductStore::new());
        let dyn_store: Arc<dyn ProductStore> = store.clone();
        let state = AppState::new(dyn_store, MediaPipeline::new(config));

        Self {
            store,
            router: router(state),
            upload_dir,
        }
    }

    /// Directory `path` mode writes uploads to.
    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Dispatch a request and collect the response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, form: MultipartForm) -> TestResponse {
        self.send(form.into_request(Method::POST, uri)).await
    }

    pub async fn put_form(&self, uri: &str, form: MultipartForm) -> TestResponse {
        self.send(form.into_request(Method::PUT, uri)).await
    }

    /// Create a product with `files` and return its JSON body.
    pub async fn create(&self, title: &str, files: &[Vec<u8>]) -> Value {
        let mut form = MultipartForm::product(title);
        for (i, bytes) in files.iter().enumerate() {
            form = form.media(&format!("file-{i}.png"), bytes);
        }
        let response = self.post_form("/add/products", form).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()
    }
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A complete, valid product form without files.
    pub fn product(title: &str) -> Self {
        Self::new()
            .text("title", title)
            .text("price", "25.50")
            .text("stockStatus", "In Stock")
            .text("stockCount", "12")
            .text("gender", "Female")
            .text("deliveryDays", "3")
            .text("description", "Soft cotton")
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file under an arbitrary field name.
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a file under the default `media` field.
    pub fn media(self, file_name: &str, bytes: &[u8]) -> Self {
        self.file("media", file_name, "image/png", bytes)
    }

    pub fn into_request(mut self, method: Method, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

/// Encode a horizontal-gradient JPEG.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    RgbImage::from_fn(width, height, |x, _| {
        let shade = u8::try_from(x * 255 / width.max(1)).unwrap_or(u8::MAX);
        Rgb([shade, 64, 255 - shade])
    })
    .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
    .unwrap();
    out
}

/// Encode a solid-color PNG.
pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let mut out = Vec::new();
    RgbImage::from_pixel(width, height, Rgb(color))
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}
