// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Import of arbitrary image and video URLs
//!
//! A preview inspects the URL with a `HEAD` request before anything is
//! downloaded. Imports bypass the providers and go straight to the media pool.

use chrono::Local;
use media_pool::{
    Downloader, DownloaderConfig, MediaPool, MediaPoolError, MediaRecord, filename,
};
use serde::Serialize;
use shared_types::format_file_size;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;
use utoipa::ToSchema;

/// User agent sent by direct imports
pub const DIRECT_IMPORT_USER_AGENT: &str = "Asset Import/1.0";

/// Timeout for direct preview and import requests
pub const DIRECT_IMPORT_TIMEOUT_SECONDS: u64 = 30;

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/webm",
    "video/ogg",
];

/// Errors raised by direct URL previews and imports
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DirectImportError {
    /// URL is empty, unparsable or not http(s)
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Required request value is missing
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Content type is not an accepted image or video type
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// Probing, downloading or storing failed
    #[error(transparent)]
    MediaPool(#[from] MediaPoolError),
}

/// What a direct import of a URL would produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DirectPreview {
    /// Inspected URL
    pub url: String,
    /// Reported content type
    pub content_type: String,
    /// Filename proposed for the import
    pub suggested_filename: String,
    /// Size in bytes, when reported
    pub file_size: Option<u64>,
    /// Human readable size, `Unknown` without a Content-Length
    pub file_size_formatted: String,
    /// Whether the URL serves an image
    pub is_image: bool,
    /// Whether the URL serves a video
    pub is_video: bool,
    /// URL to display as preview
    pub preview_url: String,
}

/// Previews and imports media from arbitrary URLs
#[derive(Debug, Clone)]
pub struct DirectImporter {
    downloader: Downloader,
}

impl DirectImporter {
    /// Create an importer with its own downloader
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: DownloaderConfig) -> Result<Self, DirectImportError> {
        Ok(Self {
            downloader: Downloader::new(config)?,
        })
    }

    /// Importer with the default user agent and timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn with_defaults() -> Result<Self, DirectImportError> {
        Self::new(DownloaderConfig {
            user_agent: DIRECT_IMPORT_USER_AGENT.to_string(),
            timeout_seconds: DIRECT_IMPORT_TIMEOUT_SECONDS,
        })
    }

    fn validate_url(url: &str) -> Result<&str, DirectImportError> {
        let url = url.trim();
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
            _ => Err(DirectImportError::InvalidUrl {
                url: url.to_string(),
            }),
        }
    }

    fn suggested_filename(url: &str, content_type: &str) -> String {
        match filename::basename_from_url(url) {
            Some(basename) if filename::has_extension(&basename) => basename,
            _ => {
                let extension = filename::extension_for_mime(content_type).unwrap_or("bin");
                format!(
                    "import_{}.{extension}",
                    Local::now().format("%Y-%m-%d_%H-%M-%S")
                )
            }
        }
    }

    /// Inspect `url` without downloading it
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` for malformed URLs, `MediaPool` when the `HEAD`
    /// request fails or returns a non-success status, and
    /// `UnsupportedContentType` for anything but the accepted image and
    /// video types
    pub async fn preview(&self, url: &str) -> Result<DirectPreview, DirectImportError> {
        let url = Self::validate_url(url)?;
        let probe = self.downloader.probe(url).await?;

        let content_type = probe.content_type.unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            debug!(url, content_type, "rejecting direct import");
            return Err(DirectImportError::UnsupportedContentType { content_type });
        }

        Ok(DirectPreview {
            url: url.to_string(),
            suggested_filename: Self::suggested_filename(url, &content_type),
            file_size: probe.content_length,
            file_size_formatted: probe
                .content_length
                .map_or_else(|| "Unknown".to_string(), format_file_size),
            is_image: content_type.starts_with("image/"),
            is_video: content_type.starts_with("video/"),
            preview_url: url.to_string(),
            content_type,
        })
    }

    /// Download `url` into the media pool
    ///
    /// The filename is sanitized and gets the URL's extension when it has
    /// none. A non-blank copyright is stored with the file.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when url or filename is missing, `InvalidUrl` for
    /// malformed URLs and `MediaPool` when the file exists or the download
    /// fails
    pub async fn import(
        &self,
        pool: &MediaPool,
        url: &str,
        filename: &str,
        copyright: Option<&str>,
        category_id: i64,
    ) -> Result<MediaRecord, DirectImportError> {
        if url.trim().is_empty() || filename.trim().is_empty() {
            return Err(DirectImportError::Validation {
                message: "url and filename are required".to_string(),
            });
        }
        let url = Self::validate_url(url)?;

        let mut name = filename::sanitize_filename(filename);
        if !filename::has_extension(&name)
            && let Some(extension) = filename::extension_from_url(url)
        {
            name = filename::with_extension(&name, &extension);
        }

        let record = pool
            .import_from_url(&self.downloader, url, &name, copyright, category_id)
            .await?;

        info!(url, filename = %record.filename, "direct import finished");
        Ok(record)
    }
}
