// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use external_apis::CacheStatus;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use tracing::error;

/// Total number of provider searches, labeled by provider and result.
pub static SEARCHES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "asset_import_searches_total",
        "Total number of provider searches",
        &["provider", "result"]
    )
    .expect("Failed to create asset_import_searches_total counter vec")
});

/// Histogram for search durations in seconds, cached or not.
pub static SEARCH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "asset_import_search_duration_seconds",
        "Search durations in seconds",
        &["provider", "cache"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create search duration histogram")
});

/// Response cache hit/miss/store counters
pub static CACHE_OPERATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "asset_import_cache_operations_total",
        "Total number of cache operations",
        &["operation", "provider"]
    )
    .expect("Failed to create cache operations counter vec")
});

/// Imports into the media pool, labeled by source and result.
pub static IMPORTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "asset_import_imports_total",
        "Total number of imports into the media pool",
        &["source", "result"]
    )
    .expect("Failed to create asset_import_imports_total counter vec")
});

/// Record a finished search
///
/// # Arguments
/// * `provider` - Provider name
/// * `result` - `success` or `error`
/// * `cache` - Cache involvement, `None` when the search failed
/// * `duration_secs` - Duration of the search in seconds
pub fn record_search(provider: &str, result: &str, cache: Option<CacheStatus>, duration_secs: f64) {
    SEARCHES.with_label_values(&[provider, result]).inc();

    let cache_label = cache.map_or("none", CacheStatus::as_str);
    SEARCH_DURATION
        .with_label_values(&[provider, cache_label])
        .observe(duration_secs);

    match cache {
        Some(CacheStatus::Hit) => record_cache_operation("hit", provider),
        Some(CacheStatus::Miss) => {
            record_cache_operation("miss", provider);
            record_cache_operation("store", provider);
        }
        Some(CacheStatus::Disabled) | None => {}
    }
}

/// Record cache operation metrics
///
/// # Arguments
/// * `operation` - The cache operation (hit, miss, store, clear)
/// * `provider` - The provider name, or `all`
pub fn record_cache_operation(operation: &str, provider: &str) {
    CACHE_OPERATIONS
        .with_label_values(&[operation, provider])
        .inc();
}

/// Record an import attempt
///
/// # Arguments
/// * `source` - Provider name or `direct`
/// * `result` - `success` or `error`
pub fn record_import(source: &str, result: &str) {
    IMPORTS.with_label_values(&[source, result]).inc();
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    match String::from_utf8(buffer) {
        Ok(body) => ([(header::CONTENT_TYPE, encoder.format_type().to_string())], body)
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics buffer is not valid UTF-8");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_metrics_follow_cache_status() {
        let provider = "metrics-test-provider";
        record_search(provider, "success", Some(CacheStatus::Miss), 0.2);
        record_search(provider, "success", Some(CacheStatus::Hit), 0.001);
        record_search(provider, "error", None, 0.5);

        assert_eq!(SEARCHES.with_label_values(&[provider, "success"]).get(), 2);
        assert_eq!(SEARCHES.with_label_values(&[provider, "error"]).get(), 1);
        assert_eq!(
            CACHE_OPERATIONS.with_label_values(&["hit", provider]).get(),
            1
        );
        assert_eq!(
            CACHE_OPERATIONS.with_label_values(&["store", provider]).get(),
            1
        );
    }

    #[tokio::test]
    async fn handler_exports_text_format() {
        record_import("metrics-test-source", "success");

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
    }
}
