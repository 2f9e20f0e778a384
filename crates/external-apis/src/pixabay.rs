// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Pixabay API integration
//!
//! Searches images via `/api/` and videos via `/api/videos/`. Transport and
//! decoding failures are surfaced as [`ApiError`]s.

use std::{collections::BTreeMap, time::Duration};

use api_client::{
    ApiError, AssetItem, AssetSize, ConfigField, HealthStatus, ImportPlan, ImportRequest,
    MediaProvider, SearchOptions, SearchResult,
};
use media_pool::filename;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared_types::AssetType;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{non_empty_string::NonEmptyString, support::string_or_number};

pub(crate) const DEFAULT_PIXABAY_BASE_URL: &str = "https://pixabay.com";
pub(crate) const DEFAULT_PIXABAY_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_PIXABAY_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_PIXABAY_LANGUAGE: &str = "de";
const PIXABAY_PER_PAGE: u32 = 20;

/// Configuration for the Pixabay provider
#[derive(Debug, Clone)]
pub struct PixabayConfig {
    /// API key, `None` leaves the provider unconfigured
    pub api_key: Option<NonEmptyString>,
    /// Base URL, without the `/api/` suffix
    pub base_url: NonEmptyString,
    /// Search language
    pub language: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Health check timeout in seconds
    pub health_check_timeout_seconds: u64,
}

impl PixabayConfig {
    /// Create a new `PixabayConfig` with validation
    ///
    /// A blank `api_key` yields an unconfigured provider.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, String> {
        Ok(Self {
            api_key: NonEmptyString::new(api_key).ok(),
            base_url: NonEmptyString::new(base_url)?,
            language: NonEmptyString::new(DEFAULT_PIXABAY_LANGUAGE)?,
            timeout_seconds,
            health_check_timeout_seconds: DEFAULT_PIXABAY_HEALTH_CHECK_TIMEOUT_SECONDS,
        })
    }

    /// Production endpoint with the default timeout
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, String> {
        Self::new(api_key, DEFAULT_PIXABAY_BASE_URL, DEFAULT_PIXABAY_TIMEOUT_SECONDS)
    }
}

/// Errors specific to the Pixabay provider
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum PixabayError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// The key was rejected
    #[error("Authentication failed")]
    Unauthorized,

    /// Response lacked the `hits` array
    #[error("Invalid response from Pixabay API")]
    MissingHits,

    /// Provider is missing its API key
    #[error("Pixabay API key not configured")]
    NotConfigured,

    /// Request timed out
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<PixabayError> for ApiError {
    fn from(value: PixabayError) -> Self {
        match value {
            PixabayError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            PixabayError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            PixabayError::ApiError { status: 429, .. } => ApiError::RateLimitExceeded {
                retry_after_seconds: 60,
            },
            PixabayError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            PixabayError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            PixabayError::MissingHits => ApiError::InvalidResponse {
                message: value.to_string(),
            },
            PixabayError::NotConfigured => ApiError::Configuration {
                message: value.to_string(),
            },
            PixabayError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

/// Search response envelope
#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(rename = "totalHits", default)]
    total_hits: u64,
    hits: Option<Vec<PixabayHit>>,
}

/// One image or video hit
#[derive(Debug, Deserialize)]
struct PixabayHit {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    user: String,
    #[serde(rename = "previewURL")]
    preview_url: Option<String>,
    #[serde(rename = "webformatURL")]
    webformat_url: Option<String>,
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
    #[serde(rename = "imageURL")]
    image_url: Option<String>,
    #[serde(rename = "imageWidth")]
    image_width: Option<u32>,
    #[serde(rename = "imageHeight")]
    image_height: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number")]
    picture_id: Option<String>,
    videos: Option<BTreeMap<String, PixabayVideoFile>>,
}

/// One video rendition
#[derive(Debug, Deserialize)]
struct PixabayVideoFile {
    #[serde(default)]
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl PixabayVideoFile {
    fn to_size(&self) -> Option<AssetSize> {
        if self.url.is_empty() {
            return None;
        }
        Some(AssetSize {
            url: self.url.clone(),
            width: self.width.filter(|w| *w > 0),
            height: self.height.filter(|h| *h > 0),
        })
    }
}

/// Pixabay search provider
#[derive(Debug)]
pub struct PixabayProvider {
    client: Client,
    config: PixabayConfig,
}

impl PixabayProvider {
    /// Create a new Pixabay provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: PixabayConfig) -> Result<Self, PixabayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("asset-import/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PixabayError::Http)?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, video: bool) -> String {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        if video {
            format!("{base}/api/videos/")
        } else {
            format!("{base}/api/")
        }
    }

    async fn fetch(
        &self,
        query: &str,
        page: u32,
        video: bool,
    ) -> Result<SearchResult, PixabayError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(PixabayError::NotConfigured)?;

        let mut params = vec![
            ("key", api_key.as_str().to_string()),
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("per_page", PIXABAY_PER_PAGE.to_string()),
            ("safesearch", "true".to_string()),
            ("lang", self.config.language.as_str().to_string()),
        ];
        if !video {
            params.push(("image_type", "all".to_string()));
        }

        debug!(query, page, video, "executing Pixabay search");

        let seconds = self.config.timeout_seconds;
        let request = self.client.get(self.endpoint(video)).query(&params);
        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| PixabayError::Timeout { seconds })?
            .map_err(PixabayError::Http)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(PixabayError::Http)?;
                let parsed: PixabayResponse = serde_json::from_str(&body)?;
                let hits = parsed.hits.ok_or(PixabayError::MissingHits)?;

                let items = hits
                    .into_iter()
                    .filter_map(|hit| {
                        if video {
                            Self::convert_video(hit)
                        } else {
                            Self::convert_image(hit)
                        }
                    })
                    .collect();

                Ok(SearchResult {
                    items,
                    total: parsed.total_hits,
                    page,
                    total_pages: SearchResult::pages_for(parsed.total_hits, PIXABAY_PER_PAGE),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PixabayError::Unauthorized),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                warn!(
                    status = status.as_u16(),
                    error = error_text,
                    "Pixabay API error"
                );
                Err(PixabayError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    fn convert_image(hit: PixabayHit) -> Option<AssetItem> {
        let id = hit.id?;
        let web = hit.webformat_url.unwrap_or_default();
        let large = hit.large_image_url.unwrap_or_default();

        let mut sizes = BTreeMap::new();
        if let Some(preview) = hit.preview_url {
            sizes.insert("preview".to_string(), AssetSize::new(preview));
        }
        sizes.insert("web".to_string(), AssetSize::new(web.clone()));
        sizes.insert("large".to_string(), AssetSize::new(large.clone()));

        let original_url = hit.image_url.unwrap_or(large);
        let original = match (hit.image_width, hit.image_height) {
            (Some(width), Some(height)) => AssetSize::with_dimensions(original_url, width, height),
            _ => AssetSize::new(original_url),
        };
        sizes.insert("original".to_string(), original);

        Some(AssetItem {
            id,
            preview_url: web,
            title: hit.tags,
            author: hit.user,
            copyright: None,
            asset_type: AssetType::Image,
            sizes,
            extras: BTreeMap::new(),
        })
    }

    fn convert_video(hit: PixabayHit) -> Option<AssetItem> {
        let id = hit.id?;
        let videos = hit.videos.unwrap_or_default();

        let mut sizes = BTreeMap::new();
        for name in ["tiny", "small", "medium", "large"] {
            if let Some(size) = videos.get(name).and_then(PixabayVideoFile::to_size) {
                sizes.insert(name.to_string(), size);
            }
        }
        if !sizes.contains_key("large")
            && let Some(medium) = sizes.get("medium").cloned()
        {
            sizes.insert("large".to_string(), medium);
        }

        let preview_url = hit
            .picture_id
            .map(|picture| format!("https://i.vimeocdn.com/video/{picture}_640x360.jpg"))
            .unwrap_or_default();

        Some(AssetItem {
            id,
            preview_url,
            title: hit.tags,
            author: hit.user,
            copyright: None,
            asset_type: AssetType::Video,
            sizes,
            extras: BTreeMap::new(),
        })
    }

    /// File extension for an import URL
    fn import_extension(url: &str) -> String {
        filename::extension_from_url(url).unwrap_or_else(|| {
            if url.contains("vimeocdn.com") {
                "mp4".to_string()
            } else {
                "jpg".to_string()
            }
        })
    }
}

impl MediaProvider for PixabayProvider {
    fn name(&self) -> &'static str {
        "pixabay"
    }

    fn title(&self) -> &'static str {
        "Pixabay"
    }

    fn icon(&self) -> &'static str {
        "fa-images"
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::text("apikey", "API key")
                .with_notice("Create a free key at https://pixabay.com/api/docs/"),
        ]
    }

    fn default_options(&self) -> SearchOptions {
        SearchOptions::new().with("type", "image")
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        options: &SearchOptions,
    ) -> Result<SearchResult, ApiError> {
        let video = options.media_type() == Some("video");
        Ok(self.fetch(query, page, video).await?)
    }

    async fn prepare_import(&self, request: &ImportRequest) -> Result<ImportPlan, ApiError> {
        if !self.is_configured() {
            return Err(PixabayError::NotConfigured.into());
        }

        let stem = filename::sanitize_stem(&request.filename);
        let extension = Self::import_extension(&request.url);

        Ok(ImportPlan {
            url: request.url.clone(),
            filename: filename::with_extension(&stem, &extension),
            copyright: Some(
                request
                    .copyright_text()
                    .map_or_else(|| self.default_copyright(), str::to_string),
            ),
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let Some(api_key) = self.config.api_key.as_ref() else {
            return Ok(HealthStatus::not_configured());
        };

        let request = self.client.get(self.endpoint(false)).query(&[
            ("key", api_key.as_str()),
            ("q", "test"),
            ("per_page", "3"),
        ]);

        let start_time = std::time::Instant::now();
        let seconds = self.config.health_check_timeout_seconds;
        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| PixabayError::Timeout { seconds })?
            .map_err(PixabayError::Http)?;

        match response.status() {
            StatusCode::OK => {
                info!(elapsed = ?start_time.elapsed(), "Pixabay health check passed");
                Ok(HealthStatus::Up)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(HealthStatus::Down {
                reason: "Authentication failed".to_string(),
            }),
            status => {
                warn!(status = status.as_u16(), "Pixabay health check failed");
                Ok(HealthStatus::Degraded {
                    reason: format!("API returned status {}", status.as_u16()),
                })
            }
        }
    }
}
