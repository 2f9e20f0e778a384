// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for media pool operations

use thiserror::Error;

/// Result type alias for media pool operations
pub type MediaPoolResult<T> = Result<T, MediaPoolError>;

/// Errors raised while storing or downloading media
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum MediaPoolError {
    /// Database query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote server answered with a non-success status
    #[error("Download of {url} failed with status {status}")]
    DownloadStatus { url: String, status: u16 },

    /// Download did not finish in time
    #[error("Download timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// A media file with this name already exists
    #[error("File already exists in media pool: {filename}")]
    FileExists { filename: String },

    /// Filename is empty or escapes the media directory
    #[error("Invalid filename: {filename}")]
    InvalidFilename { filename: String },

    /// URL is not an absolute http(s) URL
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// No media row for this filename
    #[error("Media not found: {filename}")]
    NotFound { filename: String },

    /// Downloader could not be constructed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MediaPoolError {
    /// Whether the error was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::FileExists { .. } | Self::InvalidFilename { .. } | Self::InvalidUrl { .. }
        )
    }
}
