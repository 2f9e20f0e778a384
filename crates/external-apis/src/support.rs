// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by the provider implementations

use std::sync::LazyLock;

use media_pool::{Downloader, DownloaderConfig, MediaPoolResult, filename};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tracing::debug;

static HTML_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

static IMAGE_CONTENT_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)image/(\w+)").expect("content type regex is valid"));

/// User agent for provider API calls and import lookups
pub(crate) const PROVIDER_USER_AGENT: &str = concat!("asset-import/", env!("CARGO_PKG_VERSION"));

/// Downloader used for `HEAD` lookups during import planning
pub(crate) fn import_lookup(timeout_seconds: u64) -> MediaPoolResult<Downloader> {
    Downloader::new(DownloaderConfig {
        user_agent: PROVIDER_USER_AGENT.to_string(),
        timeout_seconds,
    })
}

/// Extension for an image import URL
///
/// Taken from the URL path when present. Otherwise the subtype of the
/// `image/*` Content-Type reported for a `HEAD` request is used, falling
/// back to `jpg`.
pub(crate) async fn image_extension(downloader: &Downloader, url: &str) -> String {
    if let Some(extension) = filename::extension_from_url(url) {
        return extension;
    }

    let content_type = downloader.head_content_type(url).await;
    debug!(url, content_type = ?content_type, "Resolved import content type");

    content_type
        .as_deref()
        .and_then(|ct| IMAGE_CONTENT_TYPE.captures(ct))
        .and_then(|c| c.get(1))
        .map_or_else(|| "jpg".to_string(), |m| m.as_str().to_ascii_lowercase())
}

/// Remove HTML tags and surrounding whitespace
pub(crate) fn strip_tags(value: &str) -> String {
    HTML_TAGS.replace_all(value, "").trim().to_string()
}

/// Join attribution parts with `" / "`, dropping empty ones
pub(crate) fn join_copyright<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Accept an identifier sent either as a JSON string or a JSON number
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) if !text.is_empty() => Some(text),
        Some(Raw::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
