// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Closed set of built-in providers
//!
//! [`MediaProvider`] uses `async fn` in its methods and therefore cannot be
//! used as a trait object. [`Provider`] wraps every built-in implementation
//! and forwards each call to it.

use api_client::{
    ApiError, ConfigField, FieldMapping, HealthStatus, ImportPlan, ImportRequest, MediaProvider,
    SearchOptions, SearchResult,
};

use crate::{PexelsProvider, PixabayProvider, UnsplashProvider, WikimediaProvider};

/// Any built-in media provider
#[derive(Debug)]
pub enum Provider {
    /// Pixabay images and videos
    Pixabay(PixabayProvider),
    /// Pexels photos and videos
    Pexels(PexelsProvider),
    /// Unsplash photos
    Unsplash(UnsplashProvider),
    /// Wikimedia Commons files
    Wikimedia(WikimediaProvider),
}

macro_rules! forward {
    ($self:ident, $provider:ident => $call:expr) => {
        match $self {
            Provider::Pixabay($provider) => $call,
            Provider::Pexels($provider) => $call,
            Provider::Unsplash($provider) => $call,
            Provider::Wikimedia($provider) => $call,
        }
    };
}

impl MediaProvider for Provider {
    fn name(&self) -> &'static str {
        forward!(self, p => p.name())
    }

    fn title(&self) -> &'static str {
        forward!(self, p => p.title())
    }

    fn icon(&self) -> &'static str {
        forward!(self, p => p.icon())
    }

    fn is_configured(&self) -> bool {
        forward!(self, p => p.is_configured())
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        forward!(self, p => p.config_fields())
    }

    fn default_options(&self) -> SearchOptions {
        forward!(self, p => p.default_options())
    }

    fn field_mapping(&self) -> FieldMapping {
        forward!(self, p => p.field_mapping())
    }

    fn default_copyright(&self) -> String {
        forward!(self, p => p.default_copyright())
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        options: &SearchOptions,
    ) -> Result<SearchResult, ApiError> {
        forward!(self, p => p.search(query, page, options).await)
    }

    async fn prepare_import(&self, request: &ImportRequest) -> Result<ImportPlan, ApiError> {
        forward!(self, p => p.prepare_import(request).await)
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        forward!(self, p => p.health_check().await)
    }
}

impl From<PixabayProvider> for Provider {
    fn from(value: PixabayProvider) -> Self {
        Self::Pixabay(value)
    }
}

impl From<PexelsProvider> for Provider {
    fn from(value: PexelsProvider) -> Self {
        Self::Pexels(value)
    }
}

impl From<UnsplashProvider> for Provider {
    fn from(value: UnsplashProvider) -> Self {
        Self::Unsplash(value)
    }
}

impl From<WikimediaProvider> for Provider {
    fn from(value: WikimediaProvider) -> Self {
        Self::Wikimedia(value)
    }
}
