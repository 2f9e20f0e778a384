// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for provider listing, search, import and the cache

use axum::http::StatusCode;
use serde_json::{Value, json};

mod fixtures;
use fixtures::*;

#[tokio::test]
async fn lists_registered_providers() {
    let server = TestServer::start().await;

    let response = server.get("/v1/providers").await;
    assert_eq!(response.status(), StatusCode::OK);

    let providers: Vec<Value> = response.json().await.unwrap();
    let names: Vec<&str> = providers
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["pexels", "pixabay", "unsplash", "wikimedia"]);

    let configured = |name: &str| {
        providers
            .iter()
            .find(|p| p["name"] == name)
            .map(|p| p["configured"].as_bool().unwrap())
            .unwrap()
    };
    assert!(configured("pixabay"));
    assert!(configured("wikimedia"));
    assert!(!configured("pexels"));
    assert!(!configured("unsplash"));
}

#[tokio::test]
async fn search_is_served_from_cache_on_repeat() {
    let server = TestServer::start().await;
    mount_pixabay_search(&server.upstream, "mountain lake", 1).await;

    let request = json!({"query": "mountain lake", "page": 1});

    let first = server.post("/v1/providers/pixabay/search", &request).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-cache"], "miss");
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    assert_eq!(first["total"], 2);
    assert_eq!(first["page"], 1);

    let second = server.post("/v1/providers/pixabay/search", &request).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-cache"], "hit");
    let second: Value = second.json().await.unwrap();
    assert_eq!(first, second);

    let stats: Value = server.get("/v1/cache").await.json().await.unwrap();
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["expired_entries"], 0);
}

#[tokio::test]
async fn cleared_cache_goes_back_upstream() {
    let server = TestServer::start().await;
    mount_pixabay_search(&server.upstream, "harbour", 2).await;

    let request = json!({"query": "harbour"});
    server.post("/v1/providers/pixabay/search", &request).await;

    let response = server.delete("/v1/cache?provider=pixabay").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deleted"], 1);

    let response = server.post("/v1/providers/pixabay/search", &request).await;
    assert_eq!(response.headers()["x-cache"], "miss");

    let body: Value = server.delete("/v1/cache").await.json().await.unwrap();
    assert_eq!(body["deleted"], 1);
}

#[tokio::test]
async fn empty_query_browses_curated_photos() {
    let server = TestServer::start_with(|config| {
        config.providers.pexels.api_key = PEXELS_TEST_KEY.to_string();
    })
    .await;
    mount_pexels_curated(&server.upstream).await;

    let response = server
        .post("/v1/providers/pexels/search", &json!({"query": "  "}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["title"], "Forest in fog");
}

#[tokio::test]
async fn search_rejects_bad_requests() {
    let server = TestServer::start().await;

    let response = server
        .post("/v1/providers/flickr/search", &json!({"query": "lake"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .post("/v1/providers/pexels/search", &json!({"query": "lake"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/v1/providers/pixabay/search", &json!({"query": "lake", "page": 0}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .client
        .post(server.url("/v1/providers/pixabay/search"))
        .header("content-type", "application/json")
        .body(r#"{"query": "lake",}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("invalid JSON syntax"));
}

#[tokio::test]
async fn import_stores_file_and_rejects_duplicates() {
    let server = TestServer::start().await;
    mount_download(&server.upstream, "/get/1_1280.jpg", "image/jpeg").await;

    let request = json!({
        "url": server.upstream_url("/get/1_1280.jpg"),
        "filename": "Mountain Lake",
        "copyright": "Pixabay User"
    });

    let response = server.post("/v1/providers/pixabay/import", &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let filename = body["media"]["filename"].as_str().unwrap();
    assert!(filename.starts_with("Mountain_Lake"));
    assert!(body["message"].as_str().unwrap().contains(filename));
    assert_eq!(body["media"]["copyright"], "Pixabay User");

    let response = server.post("/v1/providers/pixabay/import", &request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let media: Vec<Value> = server.get("/v1/media").await.json().await.unwrap();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0]["filename"], filename);
}

#[tokio::test]
async fn import_requires_url_and_filename() {
    let server = TestServer::start().await;

    let response = server
        .post(
            "/v1/providers/pixabay/import",
            &json!({"url": "", "filename": "lake"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_download_failure_is_bad_gateway() {
    let server = TestServer::start().await;

    let response = server
        .post(
            "/v1/providers/pixabay/import",
            &json!({
                "url": server.upstream_url("/get/missing.jpg"),
                "filename": "missing"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn rate_limit_applies_to_api_routes() {
    let server = TestServer::start_with(|config| {
        config.rate_limiting.enabled = true;
        config.rate_limiting.requests_per_minute = 2;
    })
    .await;

    assert_eq!(server.get("/v1/providers").await.status(), StatusCode::OK);
    assert_eq!(server.get("/v1/providers").await.status(), StatusCode::OK);
    assert_eq!(
        server.get("/v1/providers").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    assert_eq!(server.get("/metrics").await.status(), StatusCode::OK);
}
