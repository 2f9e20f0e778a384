// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider registry
//!
//! Keeps the registered providers by name, puts the response cache in front
//! of their searches and hands imports to the media pool.

use std::{collections::BTreeMap, time::Instant};

use api_client::{
    ApiError, ConfigFieldError, HealthCheckConfig, HealthCheckResult, HealthStatus, ImportRequest,
    MediaProvider, SearchOptions, SearchResult,
};
use futures::future::join_all;
use media_pool::{Downloader, MediaPool, MediaPoolError, MediaRecord};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    PexelsConfig, PexelsProvider, PixabayConfig, PixabayProvider, Provider, ResponseCache,
    UnsplashConfig, UnsplashProvider, WikimediaConfig, WikimediaProvider,
    settings::ProvidersConfig,
};

/// Error type for registry operations
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum RegistryError {
    /// No provider registered under this name
    #[error("Provider not found: {name}")]
    NotFound { name: String },

    /// Provider lacks its credentials
    #[error("Provider not configured: {name}")]
    NotConfigured { name: String },

    /// Provider describes an invalid setting
    #[error("Invalid config field in provider {provider}: {source}")]
    InvalidConfigField {
        provider: String,
        #[source]
        source: ConfigFieldError,
    },

    /// Request is missing required values
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Provider call failed
    #[error(transparent)]
    Provider(#[from] ApiError),

    /// Storing the download failed
    #[error(transparent)]
    MediaPool(#[from] MediaPoolError),
}

/// Where a search result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a live cache row
    Hit,
    /// Fetched from the provider
    Miss,
    /// Fetched from the provider, no cache attached
    Disabled,
}

impl CacheStatus {
    /// Label used in logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Disabled => "disabled",
        }
    }
}

/// Result of [`ProviderRegistry::search`]
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Normalized results
    pub result: SearchResult,
    /// Cache involvement
    pub cache: CacheStatus,
}

/// Registry of media providers keyed by name
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Provider>,
    cache: Option<ResponseCache>,
    health_check: HealthCheckConfig,
}

impl ProviderRegistry {
    /// Create an empty registry without a response cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that caches search responses
    pub fn with_cache(cache: ResponseCache) -> Self {
        Self {
            cache: Some(cache),
            ..Self::default()
        }
    }

    /// Build a registry with every built-in provider
    ///
    /// A provider whose settings are invalid is logged and left out.
    pub fn from_config(config: &ProvidersConfig, cache: Option<ResponseCache>) -> Self {
        let mut registry = Self {
            cache,
            ..Self::default()
        };

        let built: [(&str, Result<Provider, String>); 4] = [
            (
                "pixabay",
                PixabayConfig::try_from(&config.pixabay).and_then(|c| {
                    PixabayProvider::new(c)
                        .map(Provider::from)
                        .map_err(|e| e.to_string())
                }),
            ),
            (
                "pexels",
                PexelsConfig::try_from(&config.pexels).and_then(|c| {
                    PexelsProvider::new(c)
                        .map(Provider::from)
                        .map_err(|e| e.to_string())
                }),
            ),
            (
                "unsplash",
                UnsplashConfig::try_from(&config.unsplash).and_then(|c| {
                    UnsplashProvider::new(c)
                        .map(Provider::from)
                        .map_err(|e| e.to_string())
                }),
            ),
            (
                "wikimedia",
                WikimediaConfig::try_from(&config.wikimedia).and_then(|c| {
                    WikimediaProvider::new(c)
                        .map(Provider::from)
                        .map_err(|e| e.to_string())
                }),
            ),
        ];

        for (name, provider) in built {
            match provider {
                Ok(provider) => {
                    if let Err(error) = registry.register(provider) {
                        warn!(provider = name, %error, "skipping provider");
                    }
                }
                Err(error) => warn!(provider = name, %error, "failed to build provider"),
            }
        }

        registry
    }

    /// Attached response cache
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Register a provider, replacing one with the same name
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfigField` if one of the provider's config fields is malformed
    pub fn register(&mut self, provider: impl Into<Provider>) -> Result<(), RegistryError> {
        let provider = provider.into();
        let name = provider.name();

        for field in provider.config_fields() {
            field
                .validate()
                .map_err(|source| RegistryError::InvalidConfigField {
                    provider: name.to_string(),
                    source,
                })?;
        }

        if self.providers.insert(name.to_string(), provider).is_some() {
            info!(provider = name, "replaced provider");
        } else {
            info!(provider = name, "registered provider");
        }
        Ok(())
    }

    /// Look up a provider
    ///
    /// Unconfigured providers are returned as well.
    pub fn get(&self, name: &str) -> Option<&Provider> {
        let Some(provider) = self.providers.get(name) else {
            warn!(provider = name, "provider not found");
            return None;
        };

        if !provider.is_configured() {
            warn!(provider = name, "provider is not configured");
        }
        Some(provider)
    }

    /// Names of all providers in sorted order
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// All providers in name order
    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    /// Whether a provider with this name is registered
    pub fn has(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Remove a provider, returning whether it was registered
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.providers.remove(name).is_some();
        if removed {
            info!(provider = name, "removed provider");
        }
        removed
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn configured(&self, name: &str) -> Result<&Provider, RegistryError> {
        let provider = self.get(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })?;

        if !provider.is_configured() {
            return Err(RegistryError::NotConfigured {
                name: name.to_string(),
            });
        }
        Ok(provider)
    }

    /// Search through a provider, consulting the response cache first
    ///
    /// `options` are merged over the provider's defaults before the cache key
    /// is derived. Only successful responses are cached, and cache failures
    /// are logged without failing the search.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `NotConfigured` for unusable providers and
    /// `Provider` when the upstream call fails
    pub async fn search(
        &self,
        name: &str,
        query: &str,
        page: u32,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, RegistryError> {
        let provider = self.configured(name)?;
        let options = options.merged_over(&provider.default_options());

        let Some(cache) = &self.cache else {
            let result = provider.search(query, page, &options).await?;
            return Ok(SearchOutcome {
                result,
                cache: CacheStatus::Disabled,
            });
        };

        let key = ResponseCache::cache_key(name, query, page, &options);
        match cache.get(name, &key).await {
            Ok(Some(result)) => {
                debug!(provider = name, query, page, "cache hit");
                return Ok(SearchOutcome {
                    result,
                    cache: CacheStatus::Hit,
                });
            }
            Ok(None) => debug!(provider = name, query, page, "cache miss"),
            Err(error) => warn!(provider = name, %error, "cache lookup failed"),
        }

        let started = Instant::now();
        let result = provider.search(query, page, &options).await?;
        debug!(
            provider = name,
            items = result.items.len(),
            elapsed = ?started.elapsed(),
            "provider search finished"
        );

        if let Err(error) = cache.store(name, &key, &result).await {
            warn!(provider = name, %error, "failed to cache search response");
        }

        Ok(SearchOutcome {
            result,
            cache: CacheStatus::Miss,
        })
    }

    /// Import an asset through a provider into the media pool
    ///
    /// The provider decides the final filename and copyright, then the file is
    /// downloaded into the pool.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty url or filename, `NotFound` or
    /// `NotConfigured` for unusable providers, and `MediaPool` when the file
    /// exists or the download fails
    pub async fn import(
        &self,
        name: &str,
        pool: &MediaPool,
        downloader: &Downloader,
        request: &ImportRequest,
    ) -> Result<MediaRecord, RegistryError> {
        if request.url.trim().is_empty() || request.filename.trim().is_empty() {
            return Err(RegistryError::Validation {
                message: "url and filename are required".to_string(),
            });
        }

        let provider = self.configured(name)?;
        let plan = provider.prepare_import(request).await?;

        debug!(
            provider = name,
            url = %plan.url,
            filename = %plan.filename,
            "importing asset"
        );

        let record = pool
            .import_from_url(
                downloader,
                &plan.url,
                &plan.filename,
                plan.copyright.as_deref(),
                request.category_id,
            )
            .await?;

        info!(provider = name, filename = %record.filename, "imported asset");
        Ok(record)
    }

    /// Check every provider concurrently
    ///
    /// Checks that fail or exceed the configured timeout report `Down`.
    pub async fn overall_health(&self) -> BTreeMap<String, HealthCheckResult> {
        let limit = self.health_check.timeout;

        let checks = self.providers.iter().map(|(name, provider)| async move {
            let started = Instant::now();
            let result = match timeout(limit, provider.health_check()).await {
                Ok(Ok(status)) => HealthCheckResult::new(status, started.elapsed()),
                Ok(Err(error)) => HealthCheckResult::new(
                    HealthStatus::Down {
                        reason: format!("Health check failed: {error}"),
                    },
                    started.elapsed(),
                ),
                Err(_) => HealthCheckResult::timed_out(limit),
            };
            (name.clone(), result)
        });

        join_all(checks).await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wikimedia() -> WikimediaProvider {
        WikimediaProvider::new(WikimediaConfig::with_user_agent("").unwrap()).unwrap()
    }

    fn pixabay_without_key() -> PixabayProvider {
        PixabayProvider::new(PixabayConfig::with_api_key("").unwrap()).unwrap()
    }

    #[test]
    fn registry_creation() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
        assert!(registry.cache().is_none());
    }

    #[test]
    fn register_replace_and_remove() {
        let mut registry = ProviderRegistry::new();
        registry.register(wikimedia()).unwrap();
        registry.register(pixabay_without_key()).unwrap();
        registry.register(wikimedia()).unwrap();

        assert_eq!(registry.list(), ["pixabay", "wikimedia"]);
        assert!(registry.has("wikimedia"));
        assert!(registry.get("pixabay").is_some());
        assert!(registry.get("flickr").is_none());

        assert!(registry.remove("pixabay"));
        assert!(!registry.remove("pixabay"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_config_registers_all_providers() {
        let registry = ProviderRegistry::from_config(&ProvidersConfig::default(), None);
        assert_eq!(
            registry.list(),
            ["pexels", "pixabay", "unsplash", "wikimedia"]
        );

        let configured: Vec<_> = registry
            .providers()
            .filter(|p| p.is_configured())
            .map(MediaProvider::name)
            .collect();
        assert_eq!(configured, ["wikimedia"]);
    }

    #[test]
    fn from_config_skips_invalid_settings() {
        let mut config = ProvidersConfig::default();
        config.pexels.copyright_fields = "nobody".to_string();

        let registry = ProviderRegistry::from_config(&config, None);
        assert!(!registry.has("pexels"));
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn search_unknown_and_unconfigured() {
        let mut registry = ProviderRegistry::new();
        registry.register(pixabay_without_key()).unwrap();

        let result = registry
            .search("flickr", "lake", 1, &SearchOptions::new())
            .await;
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));

        let result = registry
            .search("pixabay", "lake", 1, &SearchOptions::new())
            .await;
        assert!(matches!(result, Err(RegistryError::NotConfigured { .. })));
    }

    #[tokio::test]
    async fn overall_health_reports_unconfigured_as_down() {
        let mut registry = ProviderRegistry::new();
        registry.register(pixabay_without_key()).unwrap();

        let health = registry.overall_health().await;
        assert_eq!(health.len(), 1);
        assert!(health["pixabay"].status.is_down());
    }

    #[test]
    fn registry_error_display() {
        let error = RegistryError::NotFound {
            name: "flickr".to_string(),
        };
        assert_eq!(error.to_string(), "Provider not found: flickr");

        let error = RegistryError::InvalidConfigField {
            provider: "pexels".to_string(),
            source: ConfigFieldError::MissingName,
        };
        assert_eq!(
            error.to_string(),
            "Invalid config field in provider pexels: config field is missing a name"
        );

        assert_eq!(CacheStatus::Hit.as_str(), "hit");
    }
}
