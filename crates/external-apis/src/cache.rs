// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Database backed response cache
//!
//! Search results are stored as JSON in the `asset_import_cache` table, keyed
//! by provider and an MD5 digest of the request. Rows stay valid for a fixed
//! TTL and expired rows are purged lazily on every store.

use std::time::Duration;

use api_client::{SearchOptions, SearchResult};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use utoipa::ToSchema;

/// Default lifetime of a cached response
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors raised by the response cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Database query failed
    #[error("Cache database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Cache migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Result could not be encoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Row counts reported by [`ResponseCache::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CacheStats {
    /// All rows, live and expired
    pub total_entries: u64,
    /// Rows past their `valid_until`
    pub expired_entries: u64,
}

/// TTL cache for provider search responses
#[derive(Debug, Clone)]
pub struct ResponseCache {
    db: SqlitePool,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache on an already migrated pool
    ///
    /// See [`crate::run_migrations`].
    pub fn new(db: SqlitePool, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Lifetime of stored responses
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Derive the cache key for a search request
    ///
    /// Lowercase hex MD5 of provider, query, page and the compact JSON of the
    /// sorted options, concatenated.
    pub fn cache_key(provider: &str, query: &str, page: u32, options: &SearchOptions) -> String {
        let options = serde_json::to_string(options).unwrap_or_default();
        let digest = md5::compute(format!("{provider}{query}{page}{options}"));
        format!("{digest:x}")
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    /// Fetch a live cached response
    ///
    /// Rows that no longer decode are reported as a miss.
    pub async fn get(&self, provider: &str, key: &str) -> Result<Option<SearchResult>, CacheError> {
        let response: Option<String> = sqlx::query_scalar(
            "SELECT response FROM asset_import_cache
             WHERE provider = ? AND cache_key = ? AND valid_until > ?
             ORDER BY id DESC LIMIT 1",
        )
        .bind(provider)
        .bind(key)
        .bind(Self::now())
        .fetch_optional(&self.db)
        .await?;

        let Some(response) = response else {
            trace!(provider, key, "cache miss");
            return Ok(None);
        };

        match serde_json::from_str(&response) {
            Ok(result) => {
                trace!(provider, key, "cache hit");
                Ok(Some(result))
            }
            Err(error) => {
                warn!(provider, key, %error, "discarding undecodable cache row");
                Ok(None)
            }
        }
    }

    /// Store a response, replacing the previous row for the key
    ///
    /// Expired rows of the same provider are removed in the same transaction.
    pub async fn store(
        &self,
        provider: &str,
        key: &str,
        result: &SearchResult,
    ) -> Result<(), CacheError> {
        let response = serde_json::to_string(result)?;
        let now = Self::now();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);

        let mut tx = self.db.begin().await?;

        let purged = sqlx::query(
            "DELETE FROM asset_import_cache
             WHERE provider = ? AND (cache_key = ? OR valid_until <= ?)",
        )
        .bind(provider)
        .bind(key)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            "INSERT INTO asset_import_cache (provider, cache_key, response, created, valid_until)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(provider)
        .bind(key)
        .bind(&response)
        .bind(now)
        .bind(now.saturating_add(ttl))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(provider, key, purged, "stored response in cache");
        Ok(())
    }

    /// Delete every row, or only those of `provider`
    pub async fn clear(&self, provider: Option<&str>) -> Result<u64, CacheError> {
        let deleted = match provider {
            Some(provider) => {
                sqlx::query("DELETE FROM asset_import_cache WHERE provider = ?")
                    .bind(provider)
                    .execute(&self.db)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM asset_import_cache")
                    .execute(&self.db)
                    .await?
            }
        }
        .rows_affected();

        info!(provider = provider.unwrap_or("all"), deleted, "cleared response cache");
        Ok(deleted)
    }

    /// Delete expired rows of all providers
    pub async fn cleanup_expired(&self) -> Result<u64, CacheError> {
        let deleted = sqlx::query("DELETE FROM asset_import_cache WHERE valid_until <= ?")
            .bind(Self::now())
            .execute(&self.db)
            .await?
            .rows_affected();

        debug!(deleted, "removed expired cache rows");
        Ok(deleted)
    }

    /// Count live and expired rows
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let (total, expired): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN valid_until <= ? THEN 1 ELSE 0 END), 0)
             FROM asset_import_cache",
        )
        .bind(Self::now())
        .fetch_one(&self.db)
        .await?;

        Ok(CacheStats {
            total_entries: u64::try_from(total).unwrap_or_default(),
            expired_entries: u64::try_from(expired).unwrap_or_default(),
        })
    }
}
