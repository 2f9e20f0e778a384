// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wikimedia Commons integration
//!
//! Commons needs no API key. A search is two MediaWiki API calls: a full
//! text search in the `File:` namespace, then an `imageinfo` query for the
//! titles it returned. Commons file page and upload URLs are resolved to a
//! single file.

use std::{collections::BTreeMap, str::FromStr, sync::LazyLock, time::Duration};

use api_client::{
    ApiError, AssetItem, AssetSize, ConfigField, HealthStatus, ImportPlan, ImportRequest,
    MediaProvider, SearchOptions, SearchResult,
};
use media_pool::filename;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use shared_types::AssetType;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{non_empty_string::NonEmptyString, support::strip_tags};

pub(crate) const DEFAULT_WIKIMEDIA_API_URL: &str = "https://commons.wikimedia.org/w/api.php";
pub(crate) const DEFAULT_WIKIMEDIA_USER_AGENT: &str = "Asset Import Bot/1.0";
pub(crate) const DEFAULT_WIKIMEDIA_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_WIKIMEDIA_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const WIKIMEDIA_PER_PAGE: u32 = 20;
const WIKIMEDIA_ATTRIBUTION: &str = "Wikimedia Commons";
const UNKNOWN_AUTHOR: &str = "Unknown";
const IMAGE_INFO_PROPERTIES: &str = "url|size|mime|extmetadata|user|timestamp";
const IMAGES_ONLY_FILTER: &str =
    " (filetype:jpg OR filetype:jpeg OR filetype:png OR filetype:svg OR filetype:webp)";

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/webp",
    "application/pdf",
];

const THUMBNAIL_WIDTHS: &[(&str, u32)] = &[
    ("tiny", 150),
    ("small", 300),
    ("medium", 600),
    ("large", 1200),
];

static FILE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"File:([^&?]+)").expect("file title regex is valid"));

static FILE_BASENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/([^/]+\.(?:jpg|jpeg|png|gif|svg|webp|pdf|mp4|ogv|webm|ogg|mp3|wav))$")
        .expect("file basename regex is valid")
});

/// How the attribution text of a Commons file is composed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WikimediaCopyright {
    /// `"{author} / Wikimedia Commons"`
    #[default]
    AuthorWikimedia,
    /// Author only
    Author,
    /// `"Wikimedia Commons"`
    Wikimedia,
    /// License short name
    License,
}

impl WikimediaCopyright {
    /// Configuration value of this mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorWikimedia => "author_wikimedia",
            Self::Author => "author",
            Self::Wikimedia => "wikimedia",
            Self::License => "license",
        }
    }

    fn format(self, author: &str, license: &str) -> String {
        match self {
            Self::AuthorWikimedia if !author.is_empty() && author != UNKNOWN_AUTHOR => {
                format!("{author} / {WIKIMEDIA_ATTRIBUTION}")
            }
            Self::AuthorWikimedia | Self::Wikimedia => WIKIMEDIA_ATTRIBUTION.to_string(),
            Self::Author => author.to_string(),
            Self::License => license.to_string(),
        }
    }
}

impl FromStr for WikimediaCopyright {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "author_wikimedia" => Ok(Self::AuthorWikimedia),
            "author" => Ok(Self::Author),
            "wikimedia" => Ok(Self::Wikimedia),
            "license" => Ok(Self::License),
            other => Err(format!("Unknown Wikimedia copyright mode: {other}")),
        }
    }
}

/// Configuration for the Wikimedia Commons provider
#[derive(Debug, Clone)]
pub struct WikimediaConfig {
    /// User agent sent with every API call, as required by the Wikimedia API policy
    pub user_agent: NonEmptyString,
    /// Attribution style
    pub copyright: WikimediaCopyright,
    /// Persist attribution on import
    pub set_copyright: bool,
    /// `api.php` endpoint
    pub api_url: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Health check timeout in seconds
    pub health_check_timeout_seconds: u64,
}

impl WikimediaConfig {
    /// Create a new `WikimediaConfig` with validation
    ///
    /// A blank user agent falls back to the default one.
    pub fn new(
        user_agent: impl Into<String>,
        copyright_fields: &str,
        set_copyright: bool,
        api_url: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, String> {
        let user_agent = NonEmptyString::new(user_agent)
            .or_else(|_| NonEmptyString::new(DEFAULT_WIKIMEDIA_USER_AGENT))?;

        Ok(Self {
            user_agent,
            copyright: copyright_fields.parse()?,
            set_copyright,
            api_url: NonEmptyString::new(api_url)?,
            timeout_seconds,
            health_check_timeout_seconds: DEFAULT_WIKIMEDIA_HEALTH_CHECK_TIMEOUT_SECONDS,
        })
    }

    /// Production endpoint with default attribution and timeout
    pub fn with_user_agent(user_agent: impl Into<String>) -> Result<Self, String> {
        Self::new(
            user_agent,
            WikimediaCopyright::default().as_str(),
            false,
            DEFAULT_WIKIMEDIA_API_URL,
            DEFAULT_WIKIMEDIA_TIMEOUT_SECONDS,
        )
    }
}

/// Errors specific to the Wikimedia Commons provider
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum WikimediaError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Request timed out
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<WikimediaError> for ApiError {
    fn from(value: WikimediaError) -> Self {
        match value {
            WikimediaError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            WikimediaError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            WikimediaError::ApiError { status: 429, .. } => ApiError::RateLimitExceeded {
                retry_after_seconds: 60,
            },
            WikimediaError::ApiError { status, message } if status >= 500 => {
                ApiError::ServiceUnavailable {
                    message: format!("{status}: {message}"),
                }
            }
            WikimediaError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            WikimediaError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    search: Option<Vec<SearchHit>>,
    searchinfo: Option<SearchInfo>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchInfo {
    #[serde(default)]
    totalhits: u64,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    query: Option<DetailsQuery>,
}

#[derive(Debug, Deserialize)]
struct DetailsQuery {
    #[serde(default)]
    pages: BTreeMap<String, FilePage>,
}

#[derive(Debug, Deserialize)]
struct FilePage {
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
    thumburl: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    mime: String,
    user: Option<String>,
    timestamp: Option<String>,
    #[serde(default)]
    extmetadata: BTreeMap<String, MetadataEntry>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    value: serde_json::Value,
}

impl ImageInfo {
    fn metadata(&self, key: &str) -> Option<String> {
        let value = match &self.extmetadata.get(key)?.value {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Null => return None,
            other => other.to_string(),
        };
        Some(value)
    }

    fn author(&self) -> String {
        self.metadata("Artist")
            .or_else(|| self.metadata("Credit"))
            .map(|raw| strip_tags(&raw))
            .or_else(|| self.user.clone())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }

    fn description(&self) -> String {
        self.metadata("ImageDescription")
            .or_else(|| self.metadata("ObjectName"))
            .map(|raw| strip_tags(&raw))
            .unwrap_or_default()
    }

    fn license(&self) -> String {
        self.metadata("LicenseShortName")
            .or_else(|| self.metadata("License").map(|raw| strip_tags(&raw)))
            .unwrap_or_else(|| "Unknown License".to_string())
    }

    /// Original plus thumbnail renditions at the standard widths
    fn sizes(&self) -> BTreeMap<String, AssetSize> {
        let original = AssetSize::with_dimensions(self.url.clone(), self.width, self.height);
        let thumb_base = self.url.replacen("/commons/", "/commons/thumb/", 1);
        let basename = self.url.rsplit('/').next().unwrap_or_default();

        let mut sizes = BTreeMap::new();
        for (name, target) in THUMBNAIL_WIDTHS {
            let size = if self.width > *target {
                let height = u32::try_from(
                    u64::from(self.height) * u64::from(*target) / u64::from(self.width),
                )
                .unwrap_or(u32::MAX);
                AssetSize::with_dimensions(
                    format!("{thumb_base}/{target}px-{basename}"),
                    *target,
                    height,
                )
            } else {
                original.clone()
            };
            sizes.insert((*name).to_string(), size);
        }
        sizes.insert("original".to_string(), original);
        sizes
    }
}

/// Wikimedia Commons search provider
#[derive(Debug)]
pub struct WikimediaProvider {
    client: Client,
    config: WikimediaConfig,
}

impl WikimediaProvider {
    /// Create a new Wikimedia Commons provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: WikimediaConfig) -> Result<Self, WikimediaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(WikimediaError::Http)?;

        Ok(Self { client, config })
    }

    /// Result for searches without hits
    fn no_results(page: u32) -> SearchResult {
        SearchResult {
            total_pages: 0,
            ..SearchResult::empty(page)
        }
    }

    fn is_commons_url(query: &str) -> bool {
        query.contains("commons.wikimedia.org") || query.contains("upload.wikimedia.org")
    }

    /// Extract the file name from a Commons page or upload URL
    fn filename_from_url(url: &str) -> Option<String> {
        if let Some(raw) = FILE_TITLE.captures(url).and_then(|c| c.get(1)) {
            return url::form_urlencoded::parse(raw.as_str().as_bytes())
                .next()
                .map(|(name, value)| {
                    if value.is_empty() {
                        name.into_owned()
                    } else {
                        format!("{name}={value}")
                    }
                });
        }

        FILE_BASENAME
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    async fn api_get<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, WikimediaError> {
        let seconds = self.config.timeout_seconds;
        let request = self.client.get(self.config.api_url.as_str()).query(params);

        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| WikimediaError::Timeout { seconds })?
            .map_err(WikimediaError::Http)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(WikimediaError::Http)?;
                Ok(serde_json::from_str(&body)?)
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                warn!(
                    status = status.as_u16(),
                    error = error_text,
                    "Wikimedia API error"
                );
                Err(WikimediaError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    async fn file_details(&self, titles: &str) -> Result<Vec<FilePage>, WikimediaError> {
        let response: DetailsResponse = self
            .api_get(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", titles),
                ("prop", "imageinfo"),
                ("iiprop", IMAGE_INFO_PROPERTIES),
                ("iiurlwidth", "300"),
                ("iiurlheight", "300"),
            ])
            .await?;

        Ok(response
            .query
            .map(|query| query.pages.into_values().collect())
            .unwrap_or_default())
    }

    async fn search_files(
        &self,
        query: &str,
        page: u32,
        options: &SearchOptions,
    ) -> Result<SearchResult, WikimediaError> {
        let mut search = query.to_string();
        if options.get("file_type") == Some("images") {
            search.push_str(IMAGES_ONLY_FILTER);
        }

        let limit = WIKIMEDIA_PER_PAGE.to_string();
        let offset =
            (u64::from(page.saturating_sub(1)) * u64::from(WIKIMEDIA_PER_PAGE)).to_string();

        debug!(query = %search, page, "executing Wikimedia search");

        let response: SearchResponse = self
            .api_get(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", &search),
                ("srnamespace", "6"),
                ("srlimit", &limit),
                ("sroffset", &offset),
                ("srprop", "size|wordcount|timestamp|snippet"),
                ("srinfo", "totalhits"),
            ])
            .await?;

        let Some(result_query) = response.query else {
            return Ok(Self::no_results(page));
        };
        let total = result_query.searchinfo.map_or(0, |info| info.totalhits);
        let hits = result_query.search.unwrap_or_default();
        if hits.is_empty() {
            return Ok(Self::no_results(page));
        }

        let titles: Vec<String> = hits.into_iter().map(|hit| hit.title).collect();
        let mut by_title: BTreeMap<String, AssetItem> = self
            .file_details(&titles.join("|"))
            .await?
            .into_iter()
            .filter_map(|file| {
                let title = file.title.clone();
                self.convert_file(file).map(|item| (title, item))
            })
            .collect();

        let items = titles
            .iter()
            .filter_map(|title| by_title.remove(title))
            .collect();

        Ok(SearchResult {
            items,
            total,
            page,
            total_pages: SearchResult::pages_for(total, WIKIMEDIA_PER_PAGE),
        })
    }

    async fn lookup_url(&self, url: &str, page: u32) -> Result<SearchResult, WikimediaError> {
        let Some(name) = Self::filename_from_url(url) else {
            debug!(url, "Commons URL without file name");
            return Ok(Self::no_results(page));
        };

        let files = self.file_details(&format!("File:{name}")).await?;
        let items: Vec<AssetItem> = files
            .into_iter()
            .filter_map(|file| self.convert_file(file))
            .collect();

        if items.is_empty() {
            return Ok(Self::no_results(page));
        }

        Ok(SearchResult {
            total: items.len() as u64,
            items,
            page: 1,
            total_pages: 1,
        })
    }

    fn convert_file(&self, file: FilePage) -> Option<AssetItem> {
        let info = file.imageinfo.into_iter().next()?;
        if !ALLOWED_MIME_TYPES.contains(&info.mime.as_str()) {
            debug!(title = %file.title, mime = %info.mime, "Skipping unsupported file type");
            return None;
        }

        let author = info.author();
        let license = info.license();
        let asset_type = if info.mime.starts_with("image/") {
            AssetType::Image
        } else {
            AssetType::File
        };

        let mut extras = BTreeMap::new();
        extras.insert(
            "description".to_string(),
            serde_json::Value::String(info.description()),
        );
        extras.insert(
            "license".to_string(),
            serde_json::Value::String(license.clone()),
        );
        extras.insert(
            "original_url".to_string(),
            serde_json::Value::String(info.url.clone()),
        );
        extras.insert("file_size".to_string(), serde_json::Value::from(info.size));
        extras.insert(
            "mime_type".to_string(),
            serde_json::Value::String(info.mime.clone()),
        );
        extras.insert(
            "timestamp".to_string(),
            serde_json::Value::String(info.timestamp.clone().unwrap_or_default()),
        );

        Some(AssetItem {
            id: format!("{:x}", md5::compute(info.url.as_bytes())),
            preview_url: info.thumburl.clone().unwrap_or_else(|| info.url.clone()),
            title: file
                .title
                .strip_prefix("File:")
                .unwrap_or(&file.title)
                .to_string(),
            copyright: Some(self.config.copyright.format(&author, &license)),
            author,
            asset_type,
            sizes: info.sizes(),
            extras,
        })
    }
}

impl MediaProvider for WikimediaProvider {
    fn name(&self) -> &'static str {
        "wikimedia"
    }

    fn title(&self) -> &'static str {
        "Wikimedia Commons"
    }

    fn icon(&self) -> &'static str {
        "fa-wikipedia-w"
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::text("useragent", "User agent")
                .with_notice("Identify your site, e.g. \"MySite/1.0 (admin@example.com)\""),
            ConfigField::select(
                "copyright_fields",
                "Copyright",
                &[
                    ("Author + Wikimedia Commons", "author_wikimedia"),
                    ("Only Author", "author"),
                    ("Only Wikimedia Commons", "wikimedia"),
                    ("License Info", "license"),
                ],
            ),
            ConfigField::select("set_copyright", "Set copyright", &[("No", "0"), ("Yes", "1")])
                .with_notice("Store the attribution with imported files"),
            ConfigField::select(
                "file_types",
                "File types",
                &[("All file types", "all"), ("Images only", "images")],
            ),
        ]
    }

    fn default_options(&self) -> SearchOptions {
        SearchOptions::new().with("file_type", "all")
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        options: &SearchOptions,
    ) -> Result<SearchResult, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Self::no_results(page));
        }

        let result = if Self::is_commons_url(query) {
            self.lookup_url(query, page).await
        } else {
            self.search_files(query, page, options).await
        };
        Ok(result?)
    }

    async fn prepare_import(&self, request: &ImportRequest) -> Result<ImportPlan, ApiError> {
        let mut name = filename::sanitize_filename(&request.filename);
        if !filename::has_extension(&name)
            && let Some(extension) = filename::extension_from_url(&request.url)
        {
            name = filename::with_extension(&name, &extension);
        }

        let copyright = self.config.set_copyright.then(|| {
            request
                .copyright_text()
                .map_or_else(|| self.default_copyright(), str::to_string)
        });

        Ok(ImportPlan {
            url: request.url.clone(),
            filename: name,
            copyright,
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let request = self.client.get(self.config.api_url.as_str()).query(&[
            ("action", "query"),
            ("meta", "siteinfo"),
            ("format", "json"),
        ]);

        let start_time = std::time::Instant::now();
        let seconds = self.config.health_check_timeout_seconds;
        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| WikimediaError::Timeout { seconds })?
            .map_err(WikimediaError::Http)?;

        match response.status() {
            StatusCode::OK => {
                info!(elapsed = ?start_time.elapsed(), "Wikimedia health check passed");
                Ok(HealthStatus::Up)
            }
            status => Ok(HealthStatus::Degraded {
                reason: format!("API returned status {}", status.as_u16()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, query_param},
    };

    use super::*;

    async fn setup_mock_server() -> MockServer {
        MockServer::start().await
    }

    fn create_test_config(server_url: &str) -> WikimediaConfig {
        WikimediaConfig::new(
            "Asset Import Test/1.0",
            "author_wikimedia",
            true,
            format!("{server_url}/w/api.php"),
            2,
        )
        .unwrap()
    }

    fn image_info(url: &str, width: u32, height: u32, mime: &str) -> serde_json::Value {
        serde_json::json!({
            "url": url,
            "thumburl": format!("{url}?thumb"),
            "width": width,
            "height": height,
            "size": 123_456,
            "mime": mime,
            "user": "Uploader",
            "timestamp": "2020-01-01T00:00:00Z",
            "extmetadata": {
                "Artist": {"value": "<a href=\"//commons.wikimedia.org/wiki/User:Jane\">Jane</a>"},
                "LicenseShortName": {"value": "CC BY-SA 4.0"},
                "ImageDescription": {"value": "<p>A <b>red</b> fox</p>"}
            }
        })
    }

    #[test]
    fn copyright_modes() {
        assert_eq!(
            WikimediaCopyright::AuthorWikimedia.format("Jane", "CC0"),
            "Jane / Wikimedia Commons"
        );
        assert_eq!(
            WikimediaCopyright::AuthorWikimedia.format("Unknown", "CC0"),
            "Wikimedia Commons"
        );
        assert_eq!(WikimediaCopyright::License.format("Jane", "CC0"), "CC0");
        assert_eq!(WikimediaCopyright::Author.format("Jane", "CC0"), "Jane");
    }

    #[test]
    fn filenames_from_urls() {
        assert_eq!(
            WikimediaProvider::filename_from_url(
                "https://commons.wikimedia.org/wiki/File:Red%20Fox%20(Vulpes).jpg"
            )
            .as_deref(),
            Some("Red Fox (Vulpes).jpg")
        );
        assert_eq!(
            WikimediaProvider::filename_from_url(
                "https://upload.wikimedia.org/wikipedia/commons/a/ab/Fox.PNG"
            )
            .as_deref(),
            Some("Fox.PNG")
        );
        assert_eq!(
            WikimediaProvider::filename_from_url("https://commons.wikimedia.org/wiki/Main_Page"),
            None
        );
    }

    #[test]
    fn thumbnail_sizes() {
        let info: ImageInfo = serde_json::from_value(image_info(
            "https://upload.wikimedia.org/wikipedia/commons/a/ab/Fox.jpg",
            1000,
            500,
            "image/jpeg",
        ))
        .unwrap();

        let sizes = info.sizes();
        assert_eq!(
            sizes["tiny"].url,
            "https://upload.wikimedia.org/wikipedia/commons/thumb/a/ab/Fox.jpg/150px-Fox.jpg"
        );
        assert_eq!(sizes["tiny"].height, Some(75));
        assert_eq!(sizes["medium"].width, Some(600));
        assert_eq!(sizes["large"], sizes["original"]);
        assert_eq!(sizes["original"].width, Some(1000));
    }

    #[tokio::test]
    async fn search_then_details() {
        let mock_server = setup_mock_server().await;
        let provider = WikimediaProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(header("user-agent", "Asset Import Test/1.0"))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", "fox"))
            .and(query_param("srnamespace", "6"))
            .and(query_param("sroffset", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {
                    "searchinfo": {"totalhits": 45},
                    "search": [
                        {"title": "File:Fox.jpg"},
                        {"title": "File:Fox.ogv"},
                        {"title": "File:Fox.pdf"}
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("prop", "imageinfo"))
            .and(query_param("titles", "File:Fox.jpg|File:Fox.ogv|File:Fox.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": {
                    "-1": {"title": "File:Fox.pdf", "imageinfo": [image_info(
                        "https://upload.wikimedia.org/wikipedia/commons/c/cc/Fox.pdf", 800, 1200, "application/pdf")]},
                    "11": {"title": "File:Fox.jpg", "imageinfo": [image_info(
                        "https://upload.wikimedia.org/wikipedia/commons/a/ab/Fox.jpg", 2000, 1000, "image/jpeg")]},
                    "12": {"title": "File:Fox.ogv", "imageinfo": [image_info(
                        "https://upload.wikimedia.org/wikipedia/commons/b/bb/Fox.ogv", 640, 480, "video/ogg")]}
                }}
            })))
            .mount(&mock_server)
            .await;

        let result = provider
            .search("fox", 2, &provider.default_options())
            .await
            .unwrap();

        assert_eq!(result.total, 45);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.items.len(), 2);

        let image = &result.items[0];
        assert_eq!(image.title, "Fox.jpg");
        assert_eq!(image.author, "Jane");
        assert_eq!(image.copyright.as_deref(), Some("Jane / Wikimedia Commons"));
        assert_eq!(image.asset_type, AssetType::Image);
        assert_eq!(image.extras["license"], "CC BY-SA 4.0");
        assert_eq!(image.extras["description"], "A red fox");
        assert_eq!(image.id.len(), 32);

        assert_eq!(result.items[1].asset_type, AssetType::File);
    }

    #[tokio::test]
    async fn images_filter_extends_query() {
        let mock_server = setup_mock_server().await;
        let provider = WikimediaProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(query_param(
                "srsearch",
                "fox (filetype:jpg OR filetype:jpeg OR filetype:png OR filetype:svg OR filetype:webp)",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"searchinfo": {"totalhits": 0}, "search": []}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = SearchOptions::new().with("file_type", "images");
        let result = provider.search("fox", 1, &options).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 0);
    }

    #[tokio::test]
    async fn last_page_offset_does_not_overflow() {
        let mock_server = setup_mock_server().await;
        let provider = WikimediaProvider::new(create_test_config(&mock_server.uri())).unwrap();

        let offset = (u64::from(u32::MAX - 1) * 20).to_string();
        Mock::given(method("GET"))
            .and(query_param("list", "search"))
            .and(query_param("sroffset", offset.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"searchinfo": {"totalhits": 3}, "search": []}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = provider
            .search("fox", u32::MAX, &SearchOptions::new())
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.page, u32::MAX);
    }

    #[tokio::test]
    async fn empty_query_skips_request() {
        let mock_server = setup_mock_server().await;
        let provider = WikimediaProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = provider
            .search("  ", 2, &provider.default_options())
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.page, 2);
    }

    #[tokio::test]
    async fn commons_url_lookup() {
        let mock_server = setup_mock_server().await;
        let provider = WikimediaProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .and(query_param("titles", "File:Fox.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": {"11": {"title": "File:Fox.jpg", "imageinfo": [image_info(
                    "https://upload.wikimedia.org/wikipedia/commons/a/ab/Fox.jpg", 100, 100, "image/jpeg")]}}}
            })))
            .mount(&mock_server)
            .await;

        let result = provider
            .search(
                "https://commons.wikimedia.org/wiki/File:Fox.jpg",
                4,
                &SearchOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.page, 1);
        assert_eq!(result.items[0].title, "Fox.jpg");
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mock_server = setup_mock_server().await;
        let provider = WikimediaProvider::new(create_test_config(&mock_server.uri())).unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let result = provider.search("fox", 1, &SearchOptions::new()).await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable { .. })));
    }

    #[tokio::test]
    async fn import_respects_set_copyright() {
        let provider =
            WikimediaProvider::new(create_test_config("https://commons.example")).unwrap();

        let request = ImportRequest {
            url: "https://upload.wikimedia.org/wikipedia/commons/a/ab/Fox.jpg".to_string(),
            filename: "Red fox (Vulpes)".to_string(),
            copyright: Some("Jane / Wikimedia Commons".to_string()),
            category_id: 0,
        };

        let plan = provider.prepare_import(&request).await.unwrap();
        assert_eq!(plan.filename, "Red_fox_Vulpes.jpg");
        assert_eq!(plan.copyright.as_deref(), Some("Jane / Wikimedia Commons"));

        let mut config = create_test_config("https://commons.example");
        config.set_copyright = false;
        let provider = WikimediaProvider::new(config).unwrap();
        let plan = provider.prepare_import(&request).await.unwrap();
        assert_eq!(plan.copyright, None);
    }

    #[tokio::test]
    async fn api_client_name() {
        let provider = WikimediaProvider::new(WikimediaConfig::with_user_agent("").unwrap()).unwrap();
        assert_eq!(provider.name(), "wikimedia");
        assert!(provider.is_configured());
        assert_eq!(provider.default_copyright(), "© Wikimedia Commons");
        assert_eq!(
            provider.config.user_agent.as_str(),
            DEFAULT_WIKIMEDIA_USER_AGENT
        );
    }
}
