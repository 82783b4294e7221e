//! Media behavior per storage mode, driven through the HTTP surface.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::Path;

use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use image::{GenericImageView, ImageFormat};
use serde_json::Value;

use catalog_api::db::ProductStore;
use catalog_api::media::StoredMedia;
use catalog_api::models::Product;
use catalog_core::{Gender, MediaMode, ProductId, StockStatus};
use catalog_integration_tests::{MultipartForm, TestApp, jpeg, png};

fn decode_media(value: &Value) -> Vec<u8> {
    STANDARD.decode(value.as_str().unwrap()).unwrap()
}

fn legacy_product(id: i32, media: Option<StoredMedia>) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(id),
        title: format!("Legacy {id}"),
        price: "12".parse().unwrap(),
        stock_status: StockStatus::InStock,
        stock_count: Some(1),
        gender: Gender::Male,
        delivery_days: 2,
        description: None,
        media,
        likes: 3,
        comments: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Compressed
// ============================================================================

#[tokio::test]
async fn test_compressed_mode_shrinks_wide_images_to_target_width() {
    let app = TestApp::new(MediaMode::Compressed);

    let body = app.create("Tee", &[png(1600, 1200, [180, 30, 60])]).await;

    let media = body["product"]["media"].as_array().unwrap();
    assert_eq!(media.len(), 1);

    let bytes = decode_media(&media[0]);
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (800, 600));
}

#[tokio::test]
async fn test_compressed_out_of_stock_tee() {
    let app = TestApp::new(MediaMode::Compressed);
    let form = MultipartForm::new()
        .text("title", "Tee")
        .text("price", "10")
        .text("stockStatus", "Out-of-stock")
        .text("stockCount", "25")
        .text("gender", "Male")
        .text("deliveryDays", "3")
        .file("media", "tee.jpg", "image/jpeg", &jpeg(1600, 1067));

    let response = app.post_form("/add/products", form).await;

    assert_eq!(response.status, StatusCode::CREATED);
    let product = &response.json()["product"];
    assert_eq!(product["title"], "Tee");
    assert_eq!(product["price"], 10.0);
    assert!(product.get("stockCount").is_none());

    let media = product["media"].as_array().unwrap();
    assert_eq!(media.len(), 1);
    let decoded = image::load_from_memory(&decode_media(&media[0])).unwrap();
    assert!(decoded.width() <= 800);
    assert_eq!(decoded.dimensions(), (800, 534));

    let stored = app.store.list().await.unwrap();
    assert_eq!(stored[0].stock_count, None);
}

#[tokio::test]
async fn test_compressed_mode_keeps_order_and_never_upscales() {
    let app = TestApp::new(MediaMode::Compressed);
    let files = [
        png(1600, 800, [10, 10, 10]),
        png(400, 300, [20, 20, 20]),
        png(1000, 1000, [30, 30, 30]),
    ];

    let body = app.create("Set", &files).await;

    let dims: Vec<(u32, u32)> = body["product"]["media"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| image::load_from_memory(&decode_media(m)).unwrap().dimensions())
        .collect();
    assert_eq!(dims, [(800, 400), (400, 300), (800, 800)]);
}

#[tokio::test]
async fn test_compressed_mode_rejects_corrupt_image() {
    let app = TestApp::new(MediaMode::Compressed);
    let form = MultipartForm::product("Broken")
        .media("ok.png", &png(10, 10, [0, 0, 0]))
        .media("broken.png", b"definitely not an image");

    let response = app.post_form("/add/products", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["message"], "Media could not be processed");
    assert!(body["error"].as_str().unwrap().contains("media file 1"));
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_compressed_mode_ignores_empty_file_input() {
    let app = TestApp::new(MediaMode::Compressed);
    let form = MultipartForm::product("Plain")
        .file("media", "", "application/octet-stream", b"")
        .media("real.png", &png(1200, 300, [7, 7, 7]));

    let response = app.post_form("/add/products", form).await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    let media = response.json()["product"]["media"].as_array().unwrap().clone();
    assert_eq!(media.len(), 1);
    let decoded = image::load_from_memory(&decode_media(&media[0])).unwrap();
    assert_eq!(decoded.dimensions(), (800, 200));
}

#[tokio::test]
async fn test_compressed_mode_update_replaces_media() {
    let app = TestApp::new(MediaMode::Compressed);
    let created = app.create("Tee", &[png(100, 100, [1, 2, 3])]).await;
    let id = created["product"]["id"].as_i64().unwrap();

    let form = MultipartForm::product("Tee").media("wide.png", &png(2000, 500, [9, 9, 9]));
    let response = app.put_form(&format!("/{id}"), form).await;

    assert_eq!(response.status, StatusCode::OK);
    let media = response.json()["media"].as_array().unwrap().clone();
    assert_eq!(media.len(), 1);
    let decoded = image::load_from_memory(&decode_media(&media[0])).unwrap();
    assert_eq!(decoded.dimensions(), (800, 200));
}

// ============================================================================
// Path
// ============================================================================

#[tokio::test]
async fn test_path_mode_writes_files_and_returns_paths() {
    let app = TestApp::new(MediaMode::Path);
    let first = png(4, 4, [1, 1, 1]);
    let second = png(6, 6, [2, 2, 2]);

    let body = app.create("Tee", &[first.clone(), second.clone()]).await;

    let paths: Vec<String> = body["product"]["media"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap().to_string())
        .collect();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("file-0.png"));
    assert!(paths[1].ends_with("file-1.png"));
    assert_ne!(paths[0], paths[1]);

    for (path, expected) in paths.iter().zip([&first, &second]) {
        let path = Path::new(path);
        assert!(path.starts_with(app.upload_dir()));
        assert_eq!(&std::fs::read(path).unwrap(), expected);
    }

    // Listing returns the same paths
    let listed = app.get("/").await.json();
    assert_eq!(listed[0]["media"], body["product"]["media"]);
}

#[tokio::test]
async fn test_path_mode_serves_uploads() {
    let app = TestApp::new(MediaMode::Path);
    let image = png(3, 3, [5, 5, 5]);
    let body = app.create("Tee", &[image.clone()]).await;

    let stored = body["product"]["media"][0].as_str().unwrap().to_string();
    let file_name = Path::new(&stored).file_name().unwrap().to_str().unwrap();

    let response = app.get(&format!("/uploads/{file_name}")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), image.as_slice());
}

#[tokio::test]
async fn test_path_mode_removes_files_when_request_fails() {
    let app = TestApp::new(MediaMode::Path);
    let form = MultipartForm::new()
        .text("price", "10")
        .media("orphan.png", &png(2, 2, [0, 0, 0]));

    let response = app.post_form("/add/products", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(app.upload_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_path_mode_removes_files_when_limit_hit() {
    let app = TestApp::new(MediaMode::Path);
    let mut form = MultipartForm::product("Six");
    for i in 0..6u8 {
        form = form.media(&format!("{i}.png"), &png(2, 2, [i, i, i]));
    }

    let response = app.post_form("/add/products", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(app.upload_dir()).unwrap().count(), 0);
    assert!(app.store.is_empty().await);
}

// ============================================================================
// Records stored under another mode
// ============================================================================

#[tokio::test]
async fn test_list_skips_records_from_other_modes() {
    let app = TestApp::new(MediaMode::Raw);
    app.store
        .insert_raw(legacy_product(
            1,
            Some(StoredMedia::Paths(vec!["uploads/old.jpg".to_string()])),
        ))
        .await;
    app.store.insert_raw(legacy_product(2, None)).await;
    app.store
        .insert_raw(legacy_product(3, Some(StoredMedia::Blobs(vec![b"abc".to_vec()]))))
        .await;

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-render-errors"), Some("2"));
    let listed = response.json();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], 3);
    assert_eq!(listed[0]["likes"], 3);
    assert_eq!(listed[0]["media"][0], STANDARD.encode(b"abc"));
}

#[tokio::test]
async fn test_path_mode_skips_blob_records() {
    let app = TestApp::new(MediaMode::Path);
    app.store
        .insert_raw(legacy_product(
            1,
            Some(StoredMedia::Blobs(vec![vec![1, 2, 3]])),
        ))
        .await;
    app.create("New", &[png(2, 2, [0, 0, 0])]).await;

    let response = app.get("/").await;

    assert_eq!(response.header("x-render-errors"), Some("1"));
    let listed = response.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "New");
}
