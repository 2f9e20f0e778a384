// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Stock-media provider integrations
//!
//! This crate implements [`api_client::MediaProvider`] for Pixabay, Pexels,
//! Unsplash and Wikimedia Commons, and puts a database backed response cache
//! and a registry in front of them.
//!
//! # Architecture
//!
//! - **Providers**: [`pixabay`], [`pexels`], [`unsplash`], [`wikimedia`], wrapped by [`Provider`]
//! - **Registry**: [`registry::ProviderRegistry`] looks providers up by name, caches searches and runs imports
//! - **Response Cache**: [`cache::ResponseCache`] stores search results in SQLite with a TTL
//! - **Direct Import**: [`direct::DirectImporter`] previews and imports arbitrary media URLs
//! - **Settings**: [`settings::ProvidersConfig`] as read from configuration files
//!
//! # Features
//!
//! - **Uniform Results**: every provider returns the same [`api_client::SearchResult`] shape
//! - **Concurrent Health Checks**: all providers are checked at once with a timeout
//! - **Testing Support**: base URLs are configurable, so tests run against wiremock servers

pub mod cache;
pub mod direct;
pub mod non_empty_string;
pub mod pexels;
pub mod pixabay;
pub mod provider;
pub mod registry;
pub mod settings;
mod support;
pub mod unsplash;
pub mod wikimedia;

use sqlx::SqlitePool;

pub use cache::{CacheError, CacheStats, DEFAULT_CACHE_TTL, ResponseCache};
pub use direct::{DirectImportError, DirectImporter, DirectPreview};
pub use non_empty_string::NonEmptyString;
pub use pexels::{PexelsConfig, PexelsProvider};
pub use pixabay::{PixabayConfig, PixabayProvider};
pub use provider::Provider;
pub use registry::{CacheStatus, ProviderRegistry, RegistryError, SearchOutcome};
pub use settings::ProvidersConfig;
pub use unsplash::{UnsplashConfig, UnsplashProvider};
pub use wikimedia::{WikimediaConfig, WikimediaProvider};

/// Run the response cache migrations
///
/// Creates the `asset_import_cache` table. The media pool keeps its own
/// migrations in the same database, hence missing versions are ignored.
///
/// # Errors
///
/// Returns an error if a migration fails to apply
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), CacheError> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
