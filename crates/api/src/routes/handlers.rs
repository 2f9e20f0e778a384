// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Handlers for health, provider search and import, direct URL import, the
//! response cache and the media pool listing.

use std::time::Instant;

use api_client::{ConfigField, FieldMapping, ImportRequest, MediaProvider, SearchOptions, SearchResult};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use external_apis::{CacheStats, DirectPreview};
use media_pool::MediaRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ServerError,
    extractors::JsonExtractor,
    metrics,
    state::{HealthCheck, HealthStatus, ServerState},
};

/// Response header telling whether a search was served from the cache
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the service status together with the health of every registered provider. Providers without credentials report `Down` without degrading the service.",
    responses(
        (status = 200, description = "Service is up or degraded", body = HealthCheck),
        (status = 503, description = "Database unavailable", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let health = state.health_check().await;
    let status = if matches!(health.status, HealthStatus::Down { .. }) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(health))
}

/// Description of a registered provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderInfo {
    /// Registry key
    #[schema(example = "pixabay")]
    pub name: String,
    /// Display name
    pub title: String,
    /// Icon identifier
    pub icon: String,
    /// Whether credentials are present
    pub configured: bool,
    /// Settings the provider accepts
    pub config_fields: Vec<ConfigField>,
    /// Options applied to every search
    pub default_options: SearchOptions,
    /// Labels for attribution fields
    pub field_mapping: FieldMapping,
    /// Attribution used when an asset has none
    pub default_copyright: String,
}

impl ProviderInfo {
    fn of(provider: &impl MediaProvider) -> Self {
        Self {
            name: provider.name().to_string(),
            title: provider.title().to_string(),
            icon: provider.icon().to_string(),
            configured: provider.is_configured(),
            config_fields: provider.config_fields(),
            default_options: provider.default_options(),
            field_mapping: provider.field_mapping(),
            default_copyright: provider.default_copyright(),
        }
    }
}

/// List registered providers
#[utoipa::path(
    get,
    path = "/v1/providers",
    tag = "providers",
    summary = "List providers",
    responses(
        (status = 200, description = "Registered providers in name order", body = Vec<ProviderInfo>)
    )
)]
pub async fn list_providers_handler(State(state): State<ServerState>) -> Json<Vec<ProviderInfo>> {
    Json(state.registry().providers().map(ProviderInfo::of).collect())
}

/// Search request body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Search terms, empty to browse the provider's featured media
    #[serde(default)]
    #[schema(example = "mountain lake")]
    pub query: String,
    /// 1-based page, defaults to 1
    #[serde(default)]
    pub page: Option<u32>,
    /// Provider specific options, merged over the provider defaults
    #[serde(default)]
    pub options: SearchOptions,
}

/// Search a provider
///
/// Results are served from the response cache when a live entry exists.
/// The `x-cache` header reports `hit`, `miss` or `disabled`.
#[utoipa::path(
    post,
    path = "/v1/providers/{name}/search",
    tag = "providers",
    summary = "Search a provider",
    params(("name" = String, Path, description = "Provider name", example = "pixabay")),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Normalized search results", body = SearchResult),
        (status = 400, description = "Invalid request or provider not configured", body = String),
        (status = 404, description = "Unknown provider", body = String),
        (status = 502, description = "Provider request failed", body = String)
    )
)]
pub async fn search_handler(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    JsonExtractor(request): JsonExtractor<SearchRequest>,
) -> Result<Response, ServerError> {
    let page = request.page.unwrap_or(1);
    if page == 0 {
        return Err(ServerError::ValidationError(
            "page must be 1 or greater".to_string(),
        ));
    }

    let started = Instant::now();
    let outcome = state
        .registry()
        .search(&name, request.query.trim(), page, &request.options)
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    match outcome {
        Ok(outcome) => {
            metrics::record_search(&name, "success", Some(outcome.cache), elapsed);
            let mut response = Json(outcome.result).into_response();
            response.headers_mut().insert(
                CACHE_STATUS_HEADER,
                HeaderValue::from_static(outcome.cache.as_str()),
            );
            Ok(response)
        }
        Err(error) => {
            metrics::record_search(&name, "error", None, elapsed);
            warn!(provider = %name, %error, "search failed");
            Err(error.into())
        }
    }
}

/// Result of an import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    /// Always `true`, failures are reported as errors
    pub success: bool,
    /// Human readable summary
    pub message: String,
    /// The new media pool entry
    pub media: MediaRecord,
}

impl ImportResponse {
    fn imported(media: MediaRecord) -> Self {
        Self {
            success: true,
            message: format!("File {} imported successfully", media.filename),
            media,
        }
    }
}

/// Import an asset through a provider
#[utoipa::path(
    post,
    path = "/v1/providers/{name}/import",
    tag = "providers",
    summary = "Import a provider asset",
    params(("name" = String, Path, description = "Provider name", example = "pexels")),
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Asset stored in the media pool", body = ImportResponse),
        (status = 400, description = "Missing url or filename, or provider not configured", body = String),
        (status = 404, description = "Unknown provider", body = String),
        (status = 409, description = "A file with that name already exists", body = String),
        (status = 502, description = "Download failed", body = String)
    )
)]
pub async fn import_handler(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    JsonExtractor(request): JsonExtractor<ImportRequest>,
) -> Result<Json<ImportResponse>, ServerError> {
    let result = state
        .registry()
        .import(&name, state.media_pool(), state.downloader(), &request)
        .await;

    match result {
        Ok(media) => {
            metrics::record_import(&name, "success");
            Ok(Json(ImportResponse::imported(media)))
        }
        Err(error) => {
            metrics::record_import(&name, "error");
            warn!(provider = %name, url = %request.url, %error, "import failed");
            Err(error.into())
        }
    }
}

/// Direct preview request body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DirectPreviewRequest {
    /// Media URL to inspect
    #[schema(example = "https://example.com/photos/harbour.jpg")]
    pub url: String,
}

/// Inspect an arbitrary media URL
#[utoipa::path(
    post,
    path = "/v1/direct/preview",
    tag = "direct",
    summary = "Preview a direct import",
    request_body = DirectPreviewRequest,
    responses(
        (status = 200, description = "URL serves a supported image or video", body = DirectPreview),
        (status = 400, description = "Invalid URL or unsupported content type", body = String),
        (status = 403, description = "Direct import is disabled", body = String),
        (status = 502, description = "Remote host failed", body = String)
    )
)]
pub async fn direct_preview_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<DirectPreviewRequest>,
) -> Result<Json<DirectPreview>, ServerError> {
    let preview = state.direct_importer().preview(&request.url).await?;
    Ok(Json(preview))
}

/// Direct import request body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DirectImportRequest {
    /// Media URL to download
    pub url: String,
    /// Target filename
    pub filename: String,
    /// Attribution to store with the media
    #[serde(default)]
    pub copyright: Option<String>,
    /// Target media category
    #[serde(default)]
    pub category_id: i64,
}

/// Import an arbitrary media URL
#[utoipa::path(
    post,
    path = "/v1/direct/import",
    tag = "direct",
    summary = "Import a media URL",
    request_body = DirectImportRequest,
    responses(
        (status = 200, description = "File stored in the media pool", body = ImportResponse),
        (status = 400, description = "Missing url or filename", body = String),
        (status = 403, description = "Direct import is disabled", body = String),
        (status = 409, description = "A file with that name already exists", body = String),
        (status = 502, description = "Download failed", body = String)
    )
)]
pub async fn direct_import_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<DirectImportRequest>,
) -> Result<Json<ImportResponse>, ServerError> {
    let result = state
        .direct_importer()
        .import(
            state.media_pool(),
            &request.url,
            &request.filename,
            request.copyright.as_deref(),
            request.category_id,
        )
        .await;

    match result {
        Ok(media) => {
            metrics::record_import("direct", "success");
            Ok(Json(ImportResponse::imported(media)))
        }
        Err(error) => {
            metrics::record_import("direct", "error");
            warn!(url = %request.url, %error, "direct import failed");
            Err(error.into())
        }
    }
}

/// Cache selection
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CacheQuery {
    /// Restrict to one provider
    pub provider: Option<String>,
}

/// Result of clearing the cache
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearCacheResponse {
    /// Number of removed rows
    pub deleted: u64,
}

/// Delete cached search responses
#[utoipa::path(
    delete,
    path = "/v1/cache",
    tag = "cache",
    summary = "Clear the response cache",
    params(CacheQuery),
    responses(
        (status = 200, description = "Rows removed", body = ClearCacheResponse)
    )
)]
pub async fn clear_cache_handler(
    State(state): State<ServerState>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<ClearCacheResponse>, ServerError> {
    let Some(cache) = state.registry().cache() else {
        return Ok(Json(ClearCacheResponse { deleted: 0 }));
    };

    let provider = query.provider.as_deref().filter(|p| !p.is_empty());
    let deleted = cache.clear(provider).await?;
    metrics::record_cache_operation("clear", provider.unwrap_or("all"));

    Ok(Json(ClearCacheResponse { deleted }))
}

/// Report cache row counts
#[utoipa::path(
    get,
    path = "/v1/cache",
    tag = "cache",
    summary = "Response cache statistics",
    responses(
        (status = 200, description = "Live and expired row counts", body = CacheStats)
    )
)]
pub async fn cache_stats_handler(
    State(state): State<ServerState>,
) -> Result<Json<CacheStats>, ServerError> {
    let stats = match state.registry().cache() {
        Some(cache) => cache.stats().await?,
        None => CacheStats::default(),
    };
    Ok(Json(stats))
}

/// Media listing filter
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct MediaQuery {
    /// Only list files in this category
    pub category_id: Option<i64>,
}

/// List files in the media pool
#[utoipa::path(
    get,
    path = "/v1/media",
    tag = "media",
    summary = "List imported media",
    params(MediaQuery),
    responses(
        (status = 200, description = "Media pool entries, newest first", body = Vec<MediaRecord>)
    )
)]
pub async fn list_media_handler(
    State(state): State<ServerState>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<Vec<MediaRecord>>, ServerError> {
    let media = state.media_pool().list(query.category_id).await?;
    Ok(Json(media))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_defaults() {
        let request: SearchRequest = serde_json::from_str(r#"{"query": "lake"}"#).unwrap();
        assert_eq!(request.page, None);
        assert!(request.options.is_empty());

        let browse: SearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(browse.query, "");
    }

    #[test]
    fn direct_import_request_defaults() {
        let request: DirectImportRequest = serde_json::from_str(
            r#"{"url": "https://example.com/a.png", "filename": "a"}"#,
        )
        .unwrap();
        assert_eq!(request.copyright, None);
        assert_eq!(request.category_id, 0);
    }
}
