// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Shared helpers for HTTP integration tests
//!
//! Starts a server on an ephemeral port with providers pointed at a
//! [`MockServer`], so no test reaches the real stock-media APIs.

use std::net::SocketAddr;

use api::{Server, ServerConfig, ShutdownConfig};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

pub const PIXABAY_TEST_KEY: &str = "test-pixabay-key";
pub const PEXELS_TEST_KEY: &str = "test-pexels-key";
pub const WIKIMEDIA_API_PATH: &str = "/w/api.php";

/// A running server and the mock standing in for upstream providers
pub struct TestServer {
    pub addr: SocketAddr,
    pub upstream: MockServer,
    pub client: reqwest::Client,
    token: CancellationToken,
}

impl TestServer {
    /// Pixabay configured, everything else left without credentials
    ///
    /// Every provider points at the mock, so tests only add credentials.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Like [`TestServer::start`] with a hook to adjust the configuration
    pub async fn start_with(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let upstream = MockServer::start().await;
        mount_wikimedia_siteinfo(&upstream).await;

        let mut config = ServerConfig::for_testing();
        config.providers.pixabay.api_key = PIXABAY_TEST_KEY.to_string();
        config.providers.pixabay.base_url = upstream.uri();
        config.providers.pexels.base_url = upstream.uri();
        config.providers.unsplash.base_url = upstream.uri();
        config.providers.wikimedia.api_url = format!("{}{WIKIMEDIA_API_PATH}", upstream.uri());
        adjust(&mut config);

        let (addr, token) = Server::new(config, ShutdownConfig::default())
            .await
            .expect("Failed to create server")
            .run_for_testing()
            .await
            .expect("Failed to start test server");

        Self {
            addr,
            upstream,
            client: reqwest::Client::new(),
            token,
        }
    }

    pub fn url(&self, route: &str) -> String {
        format!("http://{}{route}", self.addr)
    }

    pub fn upstream_url(&self, route: &str) -> String {
        format!("{}{route}", self.upstream.uri())
    }

    pub async fn get(&self, route: &str) -> reqwest::Response {
        self.client
            .get(self.url(route))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn post(&self, route: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(route))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn delete(&self, route: &str) -> reqwest::Response {
        self.client
            .delete(self.url(route))
            .send()
            .await
            .expect("Failed to send request")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn mount_wikimedia_siteinfo(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(WIKIMEDIA_API_PATH))
        .and(query_param("meta", "siteinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"general": {"sitename": "Wikimedia Commons"}}
        })))
        .mount(server)
        .await;
}

/// Pixabay health probe
pub async fn mount_pixabay_health(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("q", "test"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "total": 0, "totalHits": 0, "hits": []
        })))
        .mount(server)
        .await;
}

/// Pixabay image search for `query`, expected to be hit `times` times
pub async fn mount_pixabay_search(server: &MockServer, query: &str, times: u64) {
    let hit = |id: u64, tags: &str| {
        json!({
            "id": id,
            "tags": tags,
            "user": "Pixabay User",
            "previewURL": format!("https://cdn.pixabay.com/photo/{id}_150.jpg"),
            "webformatURL": format!("https://pixabay.com/get/{id}_640.jpg"),
            "largeImageURL": format!("https://pixabay.com/get/{id}_1280.jpg"),
            "imageWidth": 4000,
            "imageHeight": 3000
        })
    };

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("key", PIXABAY_TEST_KEY))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "totalHits": 2,
            "hits": [hit(1, "lake, water"), hit(2, "lake, sunset")]
        })))
        .expect(times)
        .mount(server)
        .await;
}

/// Pexels curated photos, served for searches without terms
pub async fn mount_pexels_curated(server: &MockServer) {
    let photo = |id: u64| {
        json!({
            "id": id,
            "url": format!("https://www.pexels.com/photo/forest-{id}/"),
            "alt": "Forest in fog",
            "photographer": "Jane Doe",
            "width": 4000,
            "height": 3000,
            "src": {
                "original": format!("https://images.pexels.com/photos/{id}/original.jpeg"),
                "large": format!("https://images.pexels.com/photos/{id}/large.jpeg"),
                "medium": format!("https://images.pexels.com/photos/{id}/medium.jpeg"),
                "small": format!("https://images.pexels.com/photos/{id}/small.jpeg"),
                "tiny": format!("https://images.pexels.com/photos/{id}/tiny.jpeg")
            }
        })
    };

    Mock::given(method("GET"))
        .and(path("/v1/curated"))
        .and(header("authorization", PEXELS_TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "per_page": 20,
            "photos": [photo(3_000_001), photo(3_000_002)]
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// A small binary file served with `content_type`
pub async fn mount_download(server: &MockServer, route: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(vec![7u8; 256]),
        )
        .mount(server)
        .await;
}

/// Answer HEAD probes for `route` with `content_type`
pub async fn mount_probe(server: &MockServer, route: &str, content_type: &str) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", content_type))
        .mount(server)
        .await;
}
