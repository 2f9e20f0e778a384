// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides comprehensive error types for server operations,
//! including proper HTTP response mapping and error propagation.

use std::net::SocketAddr;

use api_client::ApiError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use external_apis::{CacheError, DirectImportError, RegistryError};
use media_pool::MediaPoolError;
use thiserror::Error;

/// Comprehensive error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Database or storage setup errors
    #[error("Storage error: {message}")]
    Storage {
        /// Error message
        message: String,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// Unknown provider or media
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target file already exists in the media pool
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Feature switched off in the configuration
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Provider or remote host failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Provider rejected the request because of its rate limit
    #[error("Upstream rate limit exceeded: {0}")]
    UpstreamRateLimited(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status code reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::Storage { .. }
            | Self::TaskJoin { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError(..) | Self::JsonError { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(..) => StatusCode::NOT_FOUND,
            Self::Conflict(..) => StatusCode::CONFLICT,
            Self::Forbidden(..) => StatusCode::FORBIDDEN,
            Self::Upstream(..) => StatusCode::BAD_GATEWAY,
            Self::UpstreamRateLimited(..) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

impl From<ApiError> for ServerError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::RateLimitExceeded { .. } => Self::UpstreamRateLimited(error.to_string()),
            ApiError::NotFound { .. } => Self::NotFound(error.to_string()),
            ApiError::Configuration { .. } => Self::ValidationError(error.to_string()),
            _ => Self::Upstream(error.to_string()),
        }
    }
}

impl From<MediaPoolError> for ServerError {
    fn from(error: MediaPoolError) -> Self {
        match error {
            MediaPoolError::FileExists { .. } => Self::Conflict(error.to_string()),
            MediaPoolError::NotFound { .. } => Self::NotFound(error.to_string()),
            MediaPoolError::InvalidFilename { .. } | MediaPoolError::InvalidUrl { .. } => {
                Self::ValidationError(error.to_string())
            }
            MediaPoolError::Http(..)
            | MediaPoolError::DownloadStatus { .. }
            | MediaPoolError::Timeout { .. } => Self::Upstream(error.to_string()),
            MediaPoolError::Database(..)
            | MediaPoolError::Migrate(..)
            | MediaPoolError::Io(..)
            | MediaPoolError::Config(..) => Self::Storage {
                message: error.to_string(),
            },
        }
    }
}

impl From<RegistryError> for ServerError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::NotFound { .. } => Self::NotFound(error.to_string()),
            RegistryError::NotConfigured { .. } | RegistryError::Validation { .. } => {
                Self::ValidationError(error.to_string())
            }
            RegistryError::InvalidConfigField { .. } => Self::Config {
                message: error.to_string(),
            },
            RegistryError::Provider(api_error) => api_error.into(),
            RegistryError::MediaPool(pool_error) => pool_error.into(),
        }
    }
}

impl From<DirectImportError> for ServerError {
    fn from(error: DirectImportError) -> Self {
        match error {
            DirectImportError::InvalidUrl { .. }
            | DirectImportError::Validation { .. }
            | DirectImportError::UnsupportedContentType { .. } => {
                Self::ValidationError(error.to_string())
            }
            DirectImportError::MediaPool(pool_error) => pool_error.into(),
        }
    }
}

impl From<CacheError> for ServerError {
    fn from(error: CacheError) -> Self {
        Self::Storage {
            message: error.to_string(),
        }
    }
}
