// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration for the asset import server.

pub mod handlers;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use handlers::{
    cache_stats_handler, clear_cache_handler, direct_import_handler, direct_preview_handler,
    health_handler, import_handler, list_media_handler, list_providers_handler, search_handler,
};

use crate::{
    metrics::metrics_handler,
    middleware::{RateLimiter, direct_import_gate, rate_limiting_middleware},
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes with conditional rate limiting
pub fn create_routes(state: &ServerState, rate_limiter: RateLimiter) -> Router<ServerState> {
    // Monitoring and documentation endpoints are not rate limited
    let service_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let direct_routes = Router::new()
        .route("/direct/preview", post(direct_preview_handler))
        .route("/direct/import", post(direct_import_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            direct_import_gate,
        ));

    let mut api_routes = Router::new()
        .route("/providers", get(list_providers_handler))
        .route("/providers/{name}/search", post(search_handler))
        .route("/providers/{name}/import", post(import_handler))
        .route("/cache", get(cache_stats_handler).delete(clear_cache_handler))
        .route("/media", get(list_media_handler))
        .merge(direct_routes);

    if rate_limiter.is_enabled() {
        api_routes = api_routes.layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limiting_middleware,
        ));
    }

    Router::new()
        .merge(service_routes)
        .nest("/v1", api_routes)
}
