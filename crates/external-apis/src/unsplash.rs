// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Unsplash API integration

use std::{collections::BTreeMap, str::FromStr, time::Duration};

use api_client::{
    ApiError, AssetItem, AssetSize, ConfigField, HealthStatus, ImportPlan, ImportRequest,
    MediaProvider, SearchOptions, SearchResult,
};
use media_pool::{Downloader, MediaPoolError, filename};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use shared_types::AssetType;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    non_empty_string::NonEmptyString,
    support::{self, join_copyright},
};

pub(crate) const DEFAULT_UNSPLASH_BASE_URL: &str = "https://api.unsplash.com";
pub(crate) const DEFAULT_UNSPLASH_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_UNSPLASH_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const UNSPLASH_PER_PAGE: u32 = 20;

/// How the attribution text of an Unsplash photo is composed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnsplashCopyright {
    /// `"{photographer} / Unsplash.com"`
    #[default]
    PhotographerUnsplash,
    /// Photographer name only
    Photographer,
    /// `"Unsplash.com"`
    Unsplash,
}

impl UnsplashCopyright {
    /// Configuration value of this mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhotographerUnsplash => "photographer_unsplash",
            Self::Photographer => "photographer",
            Self::Unsplash => "unsplash",
        }
    }

    fn format(self, photographer: &str) -> String {
        match self {
            Self::PhotographerUnsplash => join_copyright([photographer, "Unsplash.com"]),
            Self::Photographer => join_copyright([photographer]),
            Self::Unsplash => "Unsplash.com".to_string(),
        }
    }
}

impl FromStr for UnsplashCopyright {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "photographer_unsplash" => Ok(Self::PhotographerUnsplash),
            "photographer" => Ok(Self::Photographer),
            "unsplash" => Ok(Self::Unsplash),
            other => Err(format!("Unknown Unsplash copyright mode: {other}")),
        }
    }
}

/// Configuration for the Unsplash provider
#[derive(Debug, Clone)]
pub struct UnsplashConfig {
    /// Access key sent as `Client-ID`
    pub access_key: Option<NonEmptyString>,
    /// Attribution style
    pub copyright: UnsplashCopyright,
    /// API base URL
    pub base_url: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Health check timeout in seconds
    pub health_check_timeout_seconds: u64,
}

impl UnsplashConfig {
    /// Create a new `UnsplashConfig` with validation
    pub fn new(
        access_key: impl Into<String>,
        copyright_fields: &str,
        base_url: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, String> {
        Ok(Self {
            access_key: NonEmptyString::new(access_key).ok(),
            copyright: copyright_fields.parse()?,
            base_url: NonEmptyString::new(base_url)?,
            timeout_seconds,
            health_check_timeout_seconds: DEFAULT_UNSPLASH_HEALTH_CHECK_TIMEOUT_SECONDS,
        })
    }

    /// Production endpoint with the default attribution and timeout
    pub fn with_access_key(access_key: impl Into<String>) -> Result<Self, String> {
        Self::new(
            access_key,
            UnsplashCopyright::default().as_str(),
            DEFAULT_UNSPLASH_BASE_URL,
            DEFAULT_UNSPLASH_TIMEOUT_SECONDS,
        )
    }
}

/// Errors specific to the Unsplash provider
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum UnsplashError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// The access key was rejected
    #[error("Authentication failed")]
    Unauthorized,

    /// Provider is missing its access key
    #[error("Unsplash API key not configured")]
    NotConfigured,

    /// Request timed out
    #[error("Request timeout")]
    Timeout { seconds: u64 },

    /// Import lookup client could not be built
    #[error("HTTP client setup failed: {0}")]
    Setup(#[from] MediaPoolError),
}

impl From<UnsplashError> for ApiError {
    fn from(value: UnsplashError) -> Self {
        match value {
            UnsplashError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            UnsplashError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            UnsplashError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            UnsplashError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            UnsplashError::NotConfigured => ApiError::Configuration {
                message: value.to_string(),
            },
            UnsplashError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
            UnsplashError::Setup(error) => ApiError::Configuration {
                message: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
    total: Option<u64>,
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    alt_description: Option<String>,
    description: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    urls: UnsplashUrls,
    user: Option<UnsplashUser>,
    links: Option<UnsplashLinks>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UnsplashUrls {
    full: String,
    regular: String,
    small: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnsplashLinks {
    html: Option<String>,
}

/// Unsplash photo search provider
#[derive(Debug)]
pub struct UnsplashProvider {
    client: Client,
    lookup: Downloader,
    config: UnsplashConfig,
}

impl UnsplashProvider {
    /// Create a new Unsplash provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: UnsplashConfig) -> Result<Self, UnsplashError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(support::PROVIDER_USER_AGENT)
            .build()
            .map_err(UnsplashError::Http)?;
        let lookup = support::import_lookup(config.timeout_seconds)?;

        Ok(Self {
            client,
            lookup,
            config,
        })
    }

    fn authorization(&self) -> Result<String, UnsplashError> {
        self.config
            .access_key
            .as_ref()
            .map(|key| format!("Client-ID {key}"))
            .ok_or(UnsplashError::NotConfigured)
    }

    fn search_url(&self) -> String {
        format!(
            "{}/search/photos",
            self.config.base_url.as_str().trim_end_matches('/')
        )
    }

    async fn search_photos(&self, query: &str, page: u32) -> Result<SearchResult, UnsplashError> {
        let request = self
            .client
            .get(self.search_url())
            .query(&[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("per_page", UNSPLASH_PER_PAGE.to_string()),
            ])
            .header(header::AUTHORIZATION, self.authorization()?);

        debug!(query, page, "executing Unsplash search");

        let seconds = self.config.timeout_seconds;
        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| UnsplashError::Timeout { seconds })?
            .map_err(UnsplashError::Http)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(UnsplashError::Http)?;
                let parsed: UnsplashSearchResponse = serde_json::from_str(&body)?;

                let total = parsed.total.unwrap_or(parsed.results.len() as u64);
                let total_pages = parsed
                    .total_pages
                    .unwrap_or_else(|| SearchResult::pages_for(total, UNSPLASH_PER_PAGE));

                Ok(SearchResult {
                    items: parsed
                        .results
                        .into_iter()
                        .map(|photo| self.convert_photo(photo))
                        .collect(),
                    total,
                    page,
                    total_pages,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(UnsplashError::Unauthorized),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                warn!(
                    status = status.as_u16(),
                    error = error_text,
                    "Unsplash API error"
                );
                Err(UnsplashError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    fn convert_photo(&self, photo: UnsplashPhoto) -> AssetItem {
        let author = photo.user.and_then(|user| user.name).unwrap_or_default();
        let urls = photo.urls;

        let mut sizes = BTreeMap::new();
        sizes.insert("small".to_string(), AssetSize::new(urls.small.clone()));
        sizes.insert("medium".to_string(), AssetSize::new(urls.regular));
        let large = match (photo.width, photo.height) {
            (Some(width), Some(height)) => AssetSize::with_dimensions(urls.full, width, height),
            _ => AssetSize::new(urls.full),
        };
        sizes.insert("large".to_string(), large);

        let mut extras = BTreeMap::new();
        if let Some(description) = photo.description.filter(|d| !d.is_empty()) {
            extras.insert(
                "description".to_string(),
                serde_json::Value::String(description),
            );
        }
        if let Some(page_url) = photo.links.and_then(|links| links.html) {
            extras.insert("source_url".to_string(), serde_json::Value::String(page_url));
        }

        AssetItem {
            id: photo.id,
            preview_url: urls.small,
            title: photo
                .alt_description
                .filter(|alt| !alt.trim().is_empty())
                .unwrap_or_else(|| "Image".to_string()),
            copyright: Some(self.config.copyright.format(&author)),
            author,
            asset_type: AssetType::Image,
            sizes,
            extras,
        }
    }
}

impl MediaProvider for UnsplashProvider {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    fn title(&self) -> &'static str {
        "Unsplash"
    }

    fn icon(&self) -> &'static str {
        "fa-camera"
    }

    fn is_configured(&self) -> bool {
        self.config.access_key.is_some()
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::text("apikey", "Access key")
                .with_notice("Register an application at https://unsplash.com/developers"),
            ConfigField::select(
                "copyright_fields",
                "Copyright",
                &[
                    ("Photographer + Unsplash", "photographer_unsplash"),
                    ("Only Photographer", "photographer"),
                    ("Only Unsplash", "unsplash"),
                ],
            ),
        ]
    }

    fn default_options(&self) -> SearchOptions {
        SearchOptions::new().with("type", "image")
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        _options: &SearchOptions,
    ) -> Result<SearchResult, ApiError> {
        if !self.is_configured() {
            return Err(UnsplashError::NotConfigured.into());
        }

        match self.search_photos(query.trim(), page).await {
            Ok(result) => Ok(result),
            Err(error) => {
                warn!(error = %error, query, page, "Unsplash search failed");
                Ok(SearchResult::empty(page))
            }
        }
    }

    async fn prepare_import(&self, request: &ImportRequest) -> Result<ImportPlan, ApiError> {
        if !self.is_configured() {
            return Err(UnsplashError::NotConfigured.into());
        }

        let stem = filename::sanitize_stem(&request.filename);
        let extension =
            support::image_extension(&self.lookup, &request.url)
                .await;

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
        let Ok(authorization) = self.authorization() else {
            return Ok(HealthStatus::not_configured());
        };

        let request = self
            .client
            .get(self.search_url())
            .query(&[("query", "test"), ("per_page", "1")])
            .header(header::AUTHORIZATION, authorization);

        let start_time = std::time::Instant::now();
        let seconds = self.config.health_check_timeout_seconds;
        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| UnsplashError::Timeout { seconds })?
            .map_err(UnsplashError::Http)?;

        match response.status() {
            StatusCode::OK => {
                info!(elapsed = ?start_time.elapsed(), "Unsplash health check passed");
                Ok(HealthStatus::Up)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(HealthStatus::Down {
                reason: "Authentication failed".to_string(),
            }),
            status => Ok(HealthStatus::Degraded {
                reason: format!("API returned status {}", status.as_u16()),
            }),
        }
    }
}
