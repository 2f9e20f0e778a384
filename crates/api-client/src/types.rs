// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Normalized result types shared by all providers

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::AssetType;
use utoipa::ToSchema;

/// One downloadable rendition of an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetSize {
    /// Download URL
    pub url: String,
    /// Width in pixels, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl AssetSize {
    /// Rendition with an unknown resolution
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
        }
    }

    /// Rendition with a known resolution
    pub fn with_dimensions(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width: Some(width),
            height: Some(height),
        }
    }
}

/// A single search hit, normalized across providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssetItem {
    /// Provider scoped identifier
    pub id: String,
    /// Thumbnail suitable for result grids
    pub preview_url: String,
    /// Title or tags
    pub title: String,
    /// Photographer or author
    pub author: String,
    /// Attribution text, when the provider supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// Media kind
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Available renditions keyed by size name (`tiny`, `small`, `medium`, `large`, ...)
    pub sizes: BTreeMap<String, AssetSize>,
    /// Provider specific fields (`license`, `description`, `mime_type`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schema(value_type = Object)]
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl AssetItem {
    /// Look up a rendition by size name
    pub fn size(&self, name: &str) -> Option<&AssetSize> {
        self.sizes.get(name)
    }
}

/// One page of normalized search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    /// Items on this page
    pub items: Vec<AssetItem>,
    /// Total number of hits reported by the provider
    pub total: u64,
    /// 1-based page number
    pub page: u32,
    /// Number of pages available
    pub total_pages: u32,
}

impl SearchResult {
    /// Empty page used when a provider swallows an upstream failure
    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            total_pages: 1,
        }
    }

    /// Single item result used for direct page URL lookups
    pub fn single(item: AssetItem) -> Self {
        Self {
            items: vec![item],
            total: 1,
            page: 1,
            total_pages: 1,
        }
    }

    /// Number of pages needed for `total` hits at `per_page` items
    pub fn pages_for(total: u64, per_page: u32) -> u32 {
        if per_page == 0 {
            return 0;
        }
        u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
    }
}

/// Display labels for attribution related fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldMapping {
    /// Label for the author column
    pub author: String,
    /// Label for the license column
    pub license: String,
    /// Label for the provider column
    pub provider: String,
    /// Label for the source URL column
    pub source_url: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            author: "Photographer/Author".to_string(),
            license: "License".to_string(),
            provider: "Provider".to_string(),
            source_url: "Source URL".to_string(),
        }
    }
}

/// Request to import a provider asset into the media pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportRequest {
    /// Rendition URL to download
    pub url: String,
    /// Desired filename, usually without extension
    pub filename: String,
    /// Attribution to store with the media
    #[serde(default)]
    pub copyright: Option<String>,
    /// Target media category
    #[serde(default)]
    pub category_id: i64,
}

impl ImportRequest {
    /// Copyright text if one was supplied and is not blank
    pub fn copyright_text(&self) -> Option<&str> {
        self.copyright
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// What a provider decided to store for an [`ImportRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPlan {
    /// Rendition URL to download
    pub url: String,
    /// Sanitized filename including extension
    pub filename: String,
    /// Copyright text to persist, if any
    pub copyright: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_shape() {
        let result = SearchResult::empty(4);
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.page, 4);
        assert_eq!(result.total_pages, 1);
    }

    #[test]
    fn pages_for_rounds_up() {
        assert_eq!(SearchResult::pages_for(0, 20), 0);
        assert_eq!(SearchResult::pages_for(20, 20), 1);
        assert_eq!(SearchResult::pages_for(21, 20), 2);
        assert_eq!(SearchResult::pages_for(5, 0), 0);
    }

    #[test]
    fn item_serializes_type_key() {
        let mut sizes = BTreeMap::new();
        sizes.insert("small".to_string(), AssetSize::new("https://cdn/small.jpg"));
        let item = AssetItem {
            id: "42".to_string(),
            preview_url: "https://cdn/preview.jpg".to_string(),
            title: "Lake".to_string(),
            author: "Jane".to_string(),
            copyright: None,
            asset_type: AssetType::Image,
            sizes,
            extras: BTreeMap::new(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["sizes"]["small"]["url"], "https://cdn/small.jpg");
        assert!(json["sizes"]["small"].get("width").is_none());
        assert!(json.get("copyright").is_none());
        assert!(json.get("extras").is_none());

        let back: AssetItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn blank_copyright_is_ignored() {
        let mut request = ImportRequest {
            url: "https://cdn/a.jpg".to_string(),
            filename: "a".to_string(),
            copyright: Some("   ".to_string()),
            category_id: 0,
        };
        assert_eq!(request.copyright_text(), None);

        request.copyright = Some(" Jane / Pexels.com ".to_string());
        assert_eq!(request.copyright_text(), Some("Jane / Pexels.com"));
    }
}
