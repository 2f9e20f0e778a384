// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Pexels API integration
//!
//! Photos come from `/v1/`, videos from `/videos/`. Upstream failures during
//! a search are logged and produce an empty page instead of an error, so a
//! flaky Pexels API never breaks the search UI.
//!
//! Queries that are Pexels page URLs (`https://www.pexels.com/photo/<slug>-<id>/`)
//! are resolved to that single photo or video.

use std::{collections::BTreeMap, str::FromStr, sync::LazyLock, time::Duration};

use api_client::{
    ApiError, AssetItem, AssetSize, ConfigField, HealthStatus, ImportPlan, ImportRequest,
    MediaProvider, SearchOptions, SearchResult,
};
use media_pool::{Downloader, MediaPoolError, filename};
use regex::Regex;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, de::DeserializeOwned};
use shared_types::AssetType;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    non_empty_string::NonEmptyString,
    support::{self, join_copyright},
};

pub(crate) const DEFAULT_PEXELS_BASE_URL: &str = "https://api.pexels.com";
pub(crate) const DEFAULT_PEXELS_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_PEXELS_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const PEXELS_PER_PAGE: u32 = 20;

static PEXELS_PAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.)?pexels\.com/(?:photo|video)/")
        .expect("pexels url regex is valid")
});

static PEXELS_PAGE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)pexels\.com/(?:photo|video)/[^/]+-(\d+)/?$").expect("pexels id regex is valid")
});

/// How the attribution text of a Pexels asset is composed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PexelsCopyright {
    /// `"{photographer} / Pexels.com"`
    #[default]
    PhotographerPexels,
    /// Photographer name only
    Photographer,
    /// `"Pexels.com"`
    Pexels,
}

impl PexelsCopyright {
    /// Configuration value of this mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhotographerPexels => "photographer_pexels",
            Self::Photographer => "photographer",
            Self::Pexels => "pexels",
        }
    }

    fn format(self, photographer: &str) -> String {
        match self {
            Self::PhotographerPexels => join_copyright([photographer, "Pexels.com"]),
            Self::Photographer => join_copyright([photographer]),
            Self::Pexels => "Pexels.com".to_string(),
        }
    }
}

impl FromStr for PexelsCopyright {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "photographer_pexels" => Ok(Self::PhotographerPexels),
            "photographer" => Ok(Self::Photographer),
            "pexels" => Ok(Self::Pexels),
            other => Err(format!("Unknown Pexels copyright mode: {other}")),
        }
    }
}

/// Configuration for the Pexels provider
#[derive(Debug, Clone)]
pub struct PexelsConfig {
    /// API key sent as the raw `Authorization` header
    pub api_key: Option<NonEmptyString>,
    /// Attribution style
    pub copyright: PexelsCopyright,
    /// Base URL, without `/v1/` or `/videos/`
    pub base_url: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Health check timeout in seconds
    pub health_check_timeout_seconds: u64,
}

impl PexelsConfig {
    /// Create a new `PexelsConfig` with validation
    pub fn new(
        api_key: impl Into<String>,
        copyright_fields: &str,
        base_url: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, String> {
        Ok(Self {
            api_key: NonEmptyString::new(api_key).ok(),
            copyright: copyright_fields.parse()?,
            base_url: NonEmptyString::new(base_url)?,
            timeout_seconds,
            health_check_timeout_seconds: DEFAULT_PEXELS_HEALTH_CHECK_TIMEOUT_SECONDS,
        })
    }

    /// Production endpoint with the default attribution and timeout
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, String> {
        Self::new(
            api_key,
            PexelsCopyright::default().as_str(),
            DEFAULT_PEXELS_BASE_URL,
            DEFAULT_PEXELS_TIMEOUT_SECONDS,
        )
    }
}

/// Errors specific to the Pexels provider
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum PexelsError {
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

    /// Provider is missing its API key
    #[error("Pexels API key not configured")]
    NotConfigured,

    /// Request timed out
    #[error("Request timeout")]
    Timeout { seconds: u64 },

    /// Import lookup client could not be built
    #[error("HTTP client setup failed: {0}")]
    Setup(#[from] MediaPoolError),
}

impl From<PexelsError> for ApiError {
    fn from(value: PexelsError) -> Self {
        match value {
            PexelsError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            PexelsError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            PexelsError::ApiError { status: 404, message } => ApiError::NotFound { message },
            PexelsError::ApiError { status: 429, .. } => ApiError::RateLimitExceeded {
                retry_after_seconds: 60,
            },
            PexelsError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            PexelsError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            PexelsError::NotConfigured => ApiError::Configuration {
                message: value.to_string(),
            },
            PexelsError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
            PexelsError::Setup(error) => ApiError::Configuration {
                message: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PexelsPhotoSource {
    original: Option<String>,
    large2x: Option<String>,
    large: Option<String>,
    medium: Option<String>,
    small: Option<String>,
    tiny: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    id: u64,
    url: Option<String>,
    alt: Option<String>,
    photographer: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    src: PexelsPhotoSource,
}

#[derive(Debug, Deserialize)]
struct PexelsUser {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    link: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    url: Option<String>,
    image: Option<String>,
    duration: Option<u64>,
    user: Option<PexelsUser>,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PhotoPage {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
    total_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VideoPage {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
    total_results: Option<u64>,
}

/// Items of one media kind with their numeric ids, plus the reported total
#[derive(Debug, Default)]
struct Partial {
    items: Vec<(u64, AssetItem)>,
    total: u64,
}

/// Pexels search provider
#[derive(Debug)]
pub struct PexelsProvider {
    client: Client,
    lookup: Downloader,
    config: PexelsConfig,
}

impl PexelsProvider {
    /// Create a new Pexels provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: PexelsConfig) -> Result<Self, PexelsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(support::PROVIDER_USER_AGENT)
            .build()
            .map_err(PexelsError::Http)?;
        let lookup = support::import_lookup(config.timeout_seconds)?;

        Ok(Self {
            client,
            lookup,
            config,
        })
    }

    fn photos_url(&self, endpoint: &str) -> String {
        format!(
            "{}/v1/{endpoint}",
            self.config.base_url.as_str().trim_end_matches('/')
        )
    }

    fn videos_url(&self, endpoint: &str) -> String {
        format!(
            "{}/videos/{endpoint}",
            self.config.base_url.as_str().trim_end_matches('/')
        )
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, PexelsError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(PexelsError::NotConfigured)?;

        debug!(url, "executing Pexels request");

        let seconds = self.config.timeout_seconds;
        let request = self
            .client
            .get(url)
            .query(params)
            .header(header::AUTHORIZATION, api_key.as_str());

        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| PexelsError::Timeout { seconds })?
            .map_err(PexelsError::Http)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(PexelsError::Http)?;
                Ok(serde_json::from_str(&body)?)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PexelsError::Unauthorized),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                warn!(
                    status = status.as_u16(),
                    error = error_text,
                    url,
                    "Pexels API error"
                );
                Err(PexelsError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    async fn search_images(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        options: &SearchOptions,
    ) -> Result<Partial, PexelsError> {
        let mut params = vec![("page", page.to_string()), ("per_page", per_page.to_string())];

        let (url, curated) = if query.is_empty() {
            (self.photos_url("curated"), true)
        } else {
            params.push(("query", query.to_string()));
            params.push((
                "orientation",
                options.get_or("orientation", "landscape").to_string(),
            ));
            if let Some(size) = options.get("size") {
                params.push(("size", size.to_string()));
            }
            (self.photos_url("search"), false)
        };

        let result: PhotoPage = self.request_json(&url, &params).await?;
        let count = result.photos.len() as u64;
        let total = if curated {
            count * 10
        } else {
            result.total_results.unwrap_or_default()
        };

        Ok(Partial {
            items: result
                .photos
                .into_iter()
                .map(|photo| (photo.id, self.convert_photo(photo)))
                .collect(),
            total,
        })
    }

    async fn search_videos(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Partial, PexelsError> {
        let mut params = vec![("page", page.to_string()), ("per_page", per_page.to_string())];

        let url = if query.is_empty() {
            self.videos_url("popular")
        } else {
            params.push(("query", query.to_string()));
            self.videos_url("search")
        };

        let result: VideoPage = self.request_json(&url, &params).await?;
        let total = result
            .total_results
            .unwrap_or(result.videos.len() as u64 * 10);

        Ok(Partial {
            items: result
                .videos
                .into_iter()
                .map(|video| (video.id, self.convert_video(video)))
                .collect(),
            total,
        })
    }

    /// Resolve a Pexels page URL to a single photo or video
    async fn lookup_page_url(&self, url: &str, page: u32) -> SearchResult {
        let Some(id) = PEXELS_PAGE_ID
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            debug!(url, "Pexels URL without asset id");
            return SearchResult::empty(page);
        };

        match self
            .request_json::<PexelsPhoto>(&self.photos_url(&format!("photos/{id}")), &[])
            .await
        {
            Ok(photo) => return SearchResult::single(self.convert_photo(photo)),
            Err(error) => debug!(id, error = %error, "Pexels photo lookup failed, trying video"),
        }

        match self
            .request_json::<PexelsVideo>(&self.videos_url(&format!("videos/{id}")), &[])
            .await
        {
            Ok(video) => SearchResult::single(self.convert_video(video)),
            Err(error) => {
                warn!(id, error = %error, "Pexels URL lookup found nothing");
                SearchResult::empty(page)
            }
        }
    }

    fn convert_photo(&self, photo: PexelsPhoto) -> AssetItem {
        let photographer = photo.photographer.unwrap_or_default();
        let src = photo.src;

        let mut sizes = BTreeMap::new();
        let mut insert = |name: &str, url: Option<&String>| {
            sizes.insert(
                name.to_string(),
                AssetSize::new(url.cloned().unwrap_or_default()),
            );
        };
        insert("tiny", src.tiny.as_ref().or(src.small.as_ref()));
        insert("small", src.small.as_ref().or(src.medium.as_ref()));
        insert("medium", src.medium.as_ref().or(src.large.as_ref()));

        let large_url = src
            .original
            .as_ref()
            .or(src.large2x.as_ref())
            .or(src.large.as_ref())
            .cloned()
            .unwrap_or_default();
        let large = match (src.original.as_ref(), photo.width, photo.height) {
            (Some(_), Some(width), Some(height)) => {
                AssetSize::with_dimensions(large_url, width, height)
            }
            _ => AssetSize::new(large_url),
        };
        sizes.insert("large".to_string(), large);

        let title = photo
            .alt
            .filter(|alt| !alt.trim().is_empty())
            .or_else(|| Some(photographer.clone()).filter(|p| !p.is_empty()))
            .unwrap_or_else(|| "Image".to_string());

        let mut extras = BTreeMap::new();
        if let Some(page_url) = photo.url {
            extras.insert("source_url".to_string(), serde_json::Value::String(page_url));
        }

        AssetItem {
            id: photo.id.to_string(),
            preview_url: src.medium.or(src.small).unwrap_or_default(),
            title,
            copyright: Some(self.config.copyright.format(&photographer)),
            author: photographer,
            asset_type: AssetType::Image,
            sizes,
            extras,
        }
    }

    fn convert_video(&self, video: PexelsVideo) -> AssetItem {
        let author = video
            .user
            .and_then(|user| user.name)
            .unwrap_or_default();

        let mut sizes = BTreeMap::new();
        for file in &video.video_files {
            let Some(link) = file.link.as_ref().filter(|l| !l.is_empty()) else {
                continue;
            };
            let height = file.height.unwrap_or_default();
            let bucket = match height {
                1080.. => "large",
                720.. => "medium",
                480.. => "small",
                _ => "tiny",
            };
            let size = match (file.width, file.height) {
                (Some(width), Some(height)) => AssetSize::with_dimensions(link.clone(), width, height),
                _ => AssetSize::new(link.clone()),
            };
            sizes.insert(bucket.to_string(), size);
        }

        if let Some(fallback) = video
            .video_files
            .iter()
            .find_map(|file| file.link.as_ref().filter(|l| !l.is_empty()))
        {
            for name in ["tiny", "small", "medium", "large"] {
                sizes
                    .entry(name.to_string())
                    .or_insert_with(|| AssetSize::new(fallback.clone()));
            }
        }

        let title = match video.duration {
            Some(duration) if duration > 0 => format!("Video ({duration}s)"),
            _ => "Video".to_string(),
        };

        let mut extras = BTreeMap::new();
        if let Some(page_url) = video.url {
            extras.insert("source_url".to_string(), serde_json::Value::String(page_url));
        }
        if let Some(duration) = video.duration {
            extras.insert("duration".to_string(), serde_json::Value::from(duration));
        }

        AssetItem {
            id: video.id.to_string(),
            preview_url: video.image.unwrap_or_default(),
            title,
            copyright: Some(self.config.copyright.format(&author)),
            author,
            asset_type: AssetType::Video,
            sizes,
            extras,
        }
    }

    async fn search_all(&self, query: &str, page: u32, options: &SearchOptions) -> SearchResult {
        let per_page = PEXELS_PER_PAGE / 2;
        let (images, videos) = tokio::join!(
            self.search_images(query, page, per_page, options),
            self.search_videos(query, page, per_page)
        );

        let images = images.unwrap_or_else(|error| {
            warn!(error = %error, query, "Pexels image search failed");
            Partial::default()
        });
        let videos = videos.unwrap_or_else(|error| {
            warn!(error = %error, query, "Pexels video search failed");
            Partial::default()
        });

        let total = (images.total + videos.total) / 2;
        let mut items: Vec<(u64, AssetItem)> =
            images.items.into_iter().chain(videos.items).collect();
        items.sort_by(|a, b| b.0.cmp(&a.0));
        items.truncate(PEXELS_PER_PAGE as usize);

        Self::finish(items, total, page)
    }

    fn finish(items: Vec<(u64, AssetItem)>, total: u64, page: u32) -> SearchResult {
        SearchResult {
            items: items.into_iter().map(|(_, item)| item).collect(),
            total,
            page,
            total_pages: SearchResult::pages_for(total, PEXELS_PER_PAGE),
        }
    }
}

impl MediaProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        "pexels"
    }

    fn title(&self) -> &'static str {
        "Pexels"
    }

    fn icon(&self) -> &'static str {
        "fa-camera"
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::text("apikey", "API key")
                .with_notice("Request a key at https://www.pexels.com/api/"),
            ConfigField::select(
                "copyright_fields",
                "Copyright",
                &[
                    ("Photographer + Pexels", "photographer_pexels"),
                    ("Only Photographer", "photographer"),
                    ("Only Pexels", "pexels"),
                ],
            )
            .with_notice("Attribution stored with imported media"),
        ]
    }

    fn default_options(&self) -> SearchOptions {
        SearchOptions::new()
            .with("type", "image")
            .with("orientation", "landscape")
            .with("size", "medium")
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        options: &SearchOptions,
    ) -> Result<SearchResult, ApiError> {
        if !self.is_configured() {
            return Err(PexelsError::NotConfigured.into());
        }

        let query = query.trim();
        if PEXELS_PAGE_URL.is_match(query) {
            return Ok(self.lookup_page_url(query, page).await);
        }

        let result = match options.media_type().unwrap_or("image") {
            "all" => return Ok(self.search_all(query, page, options).await),
            "video" => self.search_videos(query, page, PEXELS_PER_PAGE).await,
            _ => self.search_images(query, page, PEXELS_PER_PAGE, options).await,
        };

        match result {
            Ok(partial) => Ok(Self::finish(partial.items, partial.total, page)),
            Err(error) => {
                warn!(error = %error, query, page, "Pexels search failed");
                Ok(SearchResult::empty(page))
            }
        }
    }

    async fn prepare_import(&self, request: &ImportRequest) -> Result<ImportPlan, ApiError> {
        if !self.is_configured() {
            return Err(PexelsError::NotConfigured.into());
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
        let Some(api_key) = self.config.api_key.as_ref() else {
            return Ok(HealthStatus::not_configured());
        };

        let request = self
            .client
            .get(self.photos_url("curated"))
            .query(&[("per_page", "1")])
            .header(header::AUTHORIZATION, api_key.as_str());

        let start_time = std::time::Instant::now();
        let seconds = self.config.health_check_timeout_seconds;
        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| PexelsError::Timeout { seconds })?
            .map_err(PexelsError::Http)?;

        match response.status() {
            StatusCode::OK => {
                info!(elapsed = ?start_time.elapsed(), "Pexels health check passed");
                Ok(HealthStatus::Up)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(HealthStatus::Down {
                reason: "Authentication failed".to_string(),
            }),
            status => {
                warn!(status = status.as_u16(), "Pexels health check failed");
                Ok(HealthStatus::Degraded {
                    reason: format!("API returned status {}", status.as_u16()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header as header_matcher, method, path, query_param},
    };

    use super::*;

    async fn setup_mock_server() -> MockServer {
        MockServer::start().await
    }

    fn create_test_config(server_url: &str) -> PexelsConfig {
        PexelsConfig::new("test-key", "photographer_pexels", server_url, 2).unwrap()
    }

    fn photo_json(id: u64, alt: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "url": format!("https://www.pexels.com/photo/lake-{id}/"),
            "alt": alt,
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
    }

    fn video_json(id: u64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "image": format!("https://images.pexels.com/videos/{id}/preview.jpg"),
            "duration": 12,
            "user": {"name": "John Roe"},
            "video_files": [
                {"link": "https://videos.pexels.com/sd.mp4", "width": 640, "height": 360},
                {"link": "https://videos.pexels.com/hd.mp4", "width": 1280, "height": 720}
            ]
        })
    }

    #[test]
    fn copyright_modes() {
        assert_eq!(
            PexelsCopyright::PhotographerPexels.format("Jane"),
            "Jane / Pexels.com"
        );
        assert_eq!(PexelsCopyright::PhotographerPexels.format(""), "Pexels.com");
        assert_eq!(PexelsCopyright::Photographer.format("Jane"), "Jane");
        assert_eq!(PexelsCopyright::Pexels.format("Jane"), "Pexels.com");
        assert_eq!("".parse::<PexelsCopyright>(), Ok(PexelsCopyright::PhotographerPexels));
        assert!("bogus".parse::<PexelsCopyright>().is_err());
    }

    #[test]
    fn pexels_error_conversion() {
        let api_error: ApiError = PexelsError::NotConfigured.into();
        assert!(matches!(api_error, ApiError::Configuration { .. }));

        let api_error: ApiError = PexelsError::ApiError {
            status: 404,
            message: "missing".to_string(),
        }
        .into();
        assert!(matches!(api_error, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn image_search_sends_authorization() {
        let mock_server = setup_mock_server().await;
        let provider = PexelsProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header_matcher("authorization", "test-key"))
            .and(query_param("query", "lake"))
            .and(query_param("orientation", "landscape"))
            .and(query_param("per_page", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_results": 45,
                "photos": [photo_json(11, "Calm lake")]
            })))
            .mount(&mock_server)
            .await;

        let result = provider
            .search("lake", 1, &provider.default_options())
            .await
            .unwrap();

        assert_eq!(result.total, 45);
        assert_eq!(result.total_pages, 3);
        let item = &result.items[0];
        assert_eq!(item.id, "11");
        assert_eq!(item.title, "Calm lake");
        assert_eq!(item.copyright.as_deref(), Some("Jane Doe / Pexels.com"));
        assert_eq!(
            item.size("large").unwrap().url,
            "https://images.pexels.com/photos/11/original.jpeg"
        );
        assert_eq!(item.size("large").unwrap().width, Some(4000));
        assert_eq!(
            item.preview_url,
            "https://images.pexels.com/photos/11/medium.jpeg"
        );
    }

    #[tokio::test]
    async fn empty_query_uses_curated() {
        let mock_server = setup_mock_server().await;
        let provider = PexelsProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/curated"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "photos": [photo_json(1, ""), photo_json(2, "")]
            })))
            .mount(&mock_server)
            .await;

        let result = provider
            .search("", 1, &provider.default_options())
            .await
            .unwrap();

        assert_eq!(result.total, 20);
        assert_eq!(result.items[0].title, "Jane Doe");
    }

    #[tokio::test]
    async fn video_search_buckets_files() {
        let mock_server = setup_mock_server().await;
        let provider = PexelsProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_results": 3,
                "videos": [video_json(77)]
            })))
            .mount(&mock_server)
            .await;

        let options = provider.default_options().with("type", "video");
        let result = provider.search("waves", 1, &options).await.unwrap();

        let item = &result.items[0];
        assert_eq!(item.asset_type, AssetType::Video);
        assert_eq!(item.title, "Video (12s)");
        assert_eq!(item.author, "John Roe");
        assert_eq!(item.copyright.as_deref(), Some("John Roe / Pexels.com"));
        assert_eq!(item.size("tiny").unwrap().url, "https://videos.pexels.com/sd.mp4");
        assert_eq!(item.size("medium").unwrap().url, "https://videos.pexels.com/hd.mp4");
        assert_eq!(item.size("large").unwrap().url, "https://videos.pexels.com/sd.mp4");
        assert_eq!(item.size("small").unwrap().url, "https://videos.pexels.com/sd.mp4");
    }

    #[tokio::test]
    async fn all_type_merges_and_sorts() {
        let mock_server = setup_mock_server().await;
        let provider = PexelsProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("per_page", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_results": 100,
                "photos": [photo_json(5, "a"), photo_json(50, "b")]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .and(query_param("per_page", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_results": 40,
                "videos": [video_json(20)]
            })))
            .mount(&mock_server)
            .await;

        let options = provider.default_options().with("type", "all");
        let result = provider.search("sea", 1, &options).await.unwrap();

        let ids: Vec<&str> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["50", "20", "5"]);
        assert_eq!(result.total, 70);
        assert_eq!(result.total_pages, 4);
    }

    #[tokio::test]
    async fn upstream_failure_yields_empty_page() {
        let mock_server = setup_mock_server().await;
        let provider = PexelsProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&mock_server)
            .await;

        let result = provider
            .search("lake", 3, &provider.default_options())
            .await
            .unwrap();
        assert_eq!(result, SearchResult::empty(3));
    }

    #[tokio::test]
    async fn page_url_falls_back_to_video() {
        let mock_server = setup_mock_server().await;
        let provider = PexelsProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/photos/3129957"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/videos/videos/3129957"))
            .respond_with(ResponseTemplate::new(200).set_body_json(video_json(3_129_957)))
            .mount(&mock_server)
            .await;

        let result = provider
            .search(
                "https://www.pexels.com/video/drone-view-of-a-city-3129957/",
                1,
                &provider.default_options(),
            )
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.items[0].id, "3129957");
    }

    #[tokio::test]
    async fn import_uses_head_content_type() {
        let mock_server = setup_mock_server().await;
        let provider = PexelsProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("HEAD"))
            .and(path("/download/11"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
            .mount(&mock_server)
            .await;

        let plan = provider
            .prepare_import(&ImportRequest {
                url: format!("{}/download/11", mock_server.uri()),
                filename: "Calm Lake".to_string(),
                copyright: Some("Jane Doe / Pexels.com".to_string()),
                category_id: 0,
            })
            .await
            .unwrap();

        assert_eq!(plan.filename, "calm_lake.png");
        assert_eq!(plan.copyright.as_deref(), Some("Jane Doe / Pexels.com"));
    }

    #[tokio::test]
    async fn unconfigured_provider() {
        let provider = PexelsProvider::new(
            PexelsConfig::new("", "pexels", "http://localhost", 1).unwrap(),
        )
        .unwrap();

        assert!(!provider.is_configured());
        let result = provider.search("lake", 1, &SearchOptions::new()).await;
        assert!(matches!(result, Err(ApiError::Configuration { .. })));
    }

    #[tokio::test]
    async fn api_client_name() {
        let provider = PexelsProvider::new(create_test_config("https://pexels.example")).unwrap();
        assert_eq!(provider.name(), "pexels");
        assert_eq!(provider.config_fields().len(), 2);
    }
}
