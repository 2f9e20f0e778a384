// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Streaming downloads into temporary files

use std::{path::Path, time::Duration};

use reqwest::{Client, header};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::error::{MediaPoolError, MediaPoolResult};

/// User agent sent with media downloads
pub const DEFAULT_USER_AGENT: &str = "Asset Import/1.0";

/// Download timeout in seconds
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECONDS: u64 = 60;

/// Settings for [`Downloader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// `User-Agent` header value
    pub user_agent: String,
    /// Request timeout in seconds, including the body transfer
    pub timeout_seconds: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_DOWNLOAD_TIMEOUT_SECONDS,
        }
    }
}

/// A finished download waiting to be moved into the media directory
///
/// The temporary file is removed when the value is dropped without being
/// persisted.
#[derive(Debug)]
pub struct Download {
    /// Temporary file holding the body
    pub file: NamedTempFile,
    /// `Content-Type` reported by the server, without parameters
    pub content_type: Option<String>,
    /// Number of bytes written
    pub size: u64,
}

/// HTTP client for fetching remote media
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    config: DownloaderConfig,
}

impl Downloader {
    /// Build a downloader that follows redirects
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: DownloaderConfig) -> MediaPoolResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| MediaPoolError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Active settings
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Download `url` into a temporary file created inside `dir`
    ///
    /// Creating the temporary file next to its final location keeps the
    /// later rename on the same filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error for non http(s) URLs, transport failures, timeouts
    /// and non-success status codes
    pub async fn download_to(&self, url: &str, dir: &Path) -> MediaPoolResult<Download> {
        let parsed = parse_http_url(url)?;
        let seconds = self.config.timeout_seconds;

        debug!(url = %parsed, "Starting media download");

        let request = self
            .client
            .get(parsed.clone())
            .header(header::ACCEPT, "*/*");

        let mut response =
            tokio::time::timeout(Duration::from_secs(seconds), request.send())
                .await
                .map_err(|_| MediaPoolError::Timeout { seconds })??;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %parsed, status = status.as_u16(), "Media download failed");
            return Err(MediaPoolError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = content_type_of(response.headers());

        let temp = tempfile::Builder::new()
            .prefix("asset_import_")
            .tempfile_in(dir)?;
        let mut writer = tokio::fs::File::from_std(temp.reopen()?);
        let mut size = 0u64;

        loop {
            let chunk = tokio::time::timeout(Duration::from_secs(seconds), response.chunk())
                .await
                .map_err(|_| MediaPoolError::Timeout { seconds })??;
            let Some(bytes) = chunk else { break };
            writer.write_all(&bytes).await?;
            size += bytes.len() as u64;
        }
        writer.flush().await?;

        debug!(url = %parsed, bytes = size, "Media download finished");

        Ok(Download {
            file: temp,
            content_type,
            size,
        })
    }

    /// Ask the server for the `Content-Type` of `url` with a HEAD request
    ///
    /// Returns `None` when the request fails or the header is missing.
    pub async fn head_content_type(&self, url: &str) -> Option<String> {
        let parsed = parse_http_url(url).ok()?;
        let seconds = self.config.timeout_seconds;

        let response = tokio::time::timeout(
            Duration::from_secs(seconds),
            self.client.head(parsed).send(),
        )
        .await
        .ok()?
        .ok()?;

        if !response.status().is_success() {
            return None;
        }
        content_type_of(response.headers())
    }

    /// HEAD `url` and report its type and length
    ///
    /// # Errors
    ///
    /// Returns an error for invalid URLs, transport failures, timeouts and
    /// non-success status codes
    pub async fn probe(&self, url: &str) -> MediaPoolResult<Probe> {
        let parsed = parse_http_url(url)?;
        let seconds = self.config.timeout_seconds;

        let response = tokio::time::timeout(
            Duration::from_secs(seconds),
            self.client
                .head(parsed)
                .header(header::ACCEPT, "*/*")
                .send(),
        )
        .await
        .map_err(|_| MediaPoolError::Timeout { seconds })??;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaPoolError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_length = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        Ok(Probe {
            content_type: content_type_of(response.headers()),
            content_length,
        })
    }
}

/// Response headers of a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// `Content-Type` without parameters, lowercased
    pub content_type: Option<String>,
    /// `Content-Length`, when reported
    pub content_length: Option<u64>,
}

fn parse_http_url(url: &str) -> MediaPoolResult<Url> {
    match Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            Ok(parsed)
        }
        _ => Err(MediaPoolError::InvalidUrl {
            url: url.to_string(),
        }),
    }
}

fn content_type_of(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}
