// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for health, metrics and documentation endpoints

use axum::http::StatusCode;
use serde_json::Value;

mod fixtures;
use fixtures::*;

#[tokio::test]
async fn health_reports_every_provider() {
    let server = TestServer::start().await;
    mount_pixabay_health(&server.upstream, 200).await;

    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "Up");
    assert_eq!(body["environment"], "testing");

    let providers = body["providers"].as_object().unwrap();
    let names: Vec<&str> = providers.keys().map(String::as_str).collect();
    assert_eq!(names, ["pexels", "pixabay", "unsplash", "wikimedia"]);
    assert_eq!(providers["pixabay"]["status"], "Up");
    assert_eq!(providers["wikimedia"]["status"], "Up");
}

#[tokio::test]
async fn failing_provider_degrades_health() {
    let server = TestServer::start().await;
    mount_pixabay_health(&server.upstream, 401).await;

    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["status"]["Degraded"]["reason"]
        .as_str()
        .unwrap()
        .contains("pixabay"));
}

#[tokio::test]
async fn metrics_are_exposed_in_text_format() {
    let server = TestServer::start().await;
    mount_pixabay_search(&server.upstream, "harbour", 1).await;

    server
        .post(
            "/v1/providers/pixabay/search",
            &serde_json::json!({"query": "harbour"}),
        )
        .await;

    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = response.text().await.unwrap();
    assert!(text.contains("asset_import_searches_total"));
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let server = TestServer::start().await;

    let response = server.get("/api-doc/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    let paths = body["paths"].as_object().unwrap();
    for route in [
        "/health",
        "/v1/providers",
        "/v1/providers/{name}/search",
        "/v1/providers/{name}/import",
        "/v1/direct/preview",
        "/v1/direct/import",
        "/v1/cache",
        "/v1/media",
    ] {
        assert!(paths.contains_key(route), "missing {route}");
    }

    let response = server.get("/swagger-ui").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("/api-doc/openapi.json"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let server = TestServer::start().await;
    let response = server.get("/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
