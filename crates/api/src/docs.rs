// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document definition

use api_client::{
    AssetItem, AssetSize, ConfigField, FieldMapping, FieldType, ImportRequest, SearchOptions,
    SearchResult, SelectOption,
};
use external_apis::{CacheStats, DirectPreview};
use media_pool::MediaRecord;
use utoipa::OpenApi;

use crate::{
    config::Environment,
    routes::handlers::{
        self, ClearCacheResponse, DirectImportRequest, DirectPreviewRequest, ImportResponse,
        ProviderInfo, SearchRequest,
    },
    state::{HealthCheck, HealthStatus, ProviderHealth},
};

/// Generated `OpenAPI` document for the HTTP API
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Asset Import API",
        description = "Search stock-media providers and import assets into the media pool"
    ),
    paths(
        handlers::health_handler,
        handlers::list_providers_handler,
        handlers::search_handler,
        handlers::import_handler,
        handlers::direct_preview_handler,
        handlers::direct_import_handler,
        handlers::clear_cache_handler,
        handlers::cache_stats_handler,
        handlers::list_media_handler,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        ProviderHealth,
        Environment,
        ProviderInfo,
        ConfigField,
        FieldType,
        SelectOption,
        FieldMapping,
        SearchOptions,
        SearchRequest,
        SearchResult,
        AssetItem,
        AssetSize,
        ImportRequest,
        ImportResponse,
        MediaRecord,
        DirectPreviewRequest,
        DirectPreview,
        DirectImportRequest,
        ClearCacheResponse,
        CacheStats,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "providers", description = "Stock-media provider search and import"),
        (name = "direct", description = "Import from arbitrary URLs"),
        (name = "cache", description = "Response cache maintenance"),
        (name = "media", description = "Media pool contents")
    )
)]
pub struct ApiDoc;
