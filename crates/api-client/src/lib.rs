// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Media provider contract and normalized search types
//!
//! This crate provides the common abstraction every stock-media integration
//! implements, so that callers can search Pixabay, Pexels, Unsplash or
//! Wikimedia Commons and get back the same result shape.
//!
//! # Core Abstractions
//!
//! - **`MediaProvider` Trait**: search, import planning, configuration metadata and health
//! - **Normalized Types**: [`SearchResult`], [`AssetItem`], [`AssetSize`], [`SearchOptions`]
//! - **Configuration Metadata**: [`ConfigField`] describes the settings a provider needs
//! - **Error Handling**: [`ApiError`] classifies upstream failures
//! - **Health Check System**: [`HealthStatus`] reporting shared by all providers

use thiserror::Error;

pub mod config_field;
pub mod health;
pub mod options;
pub mod types;

pub use config_field::*;
pub use health::*;
pub use options::SearchOptions;
pub use types::*;

/// Strategy interface for an external stock-media search API
///
/// Implementations perform the raw HTTP calls and map the provider specific
/// JSON into [`SearchResult`]. Response caching is layered on top by the
/// caller, so `search` always talks to the upstream API.
pub trait MediaProvider: Send + Sync {
    /// Stable identifier used in routes, cache rows and logs
    fn name(&self) -> &'static str;

    /// Human readable provider title
    fn title(&self) -> &'static str;

    /// Icon identifier for UIs
    fn icon(&self) -> &'static str;

    /// Whether all required credentials are present
    fn is_configured(&self) -> bool;

    /// Settings this provider understands
    fn config_fields(&self) -> Vec<ConfigField>;

    /// Options merged underneath every search request
    fn default_options(&self) -> SearchOptions;

    /// Display labels for attribution related fields
    fn field_mapping(&self) -> FieldMapping {
        FieldMapping::default()
    }

    /// Attribution stored when an import carries no explicit copyright
    fn default_copyright(&self) -> String {
        format!("© {}", self.title())
    }

    /// Search the upstream API
    ///
    /// # Arguments
    ///
    /// * `query` - Free text query, or a provider page URL for providers that support lookups
    /// * `page` - 1-based page number
    /// * `options` - Provider options, already merged over [`MediaProvider::default_options`]
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not configured, or if the upstream
    /// request fails for providers that surface transport errors
    fn search(
        &self,
        query: &str,
        page: u32,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<SearchResult, ApiError>> + Send;

    /// Decide the final filename and copyright for an import
    ///
    /// Providers differ in how they sanitize filenames, how they derive a
    /// missing extension and whether a caller supplied copyright is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not configured or the request is invalid
    fn prepare_import(
        &self,
        request: &ImportRequest,
    ) -> impl Future<Output = Result<ImportPlan, ApiError>> + Send;

    /// Check the health of this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the health check itself cannot be performed
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;
}

/// Common errors that can occur when talking to a media provider
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// Authentication failed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Invalid response format
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Service unavailable
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Network timeout
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Requested asset does not exist upstream
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Provider independent error
    #[error(transparent)]
    Custom { error: anyhow::Error },
}
