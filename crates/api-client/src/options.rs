// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider search options

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// String options passed to a provider search
///
/// Keys are kept sorted so the serialized form is stable, which the
/// response cache relies on when deriving its keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object, example = json!({"type": "image", "orientation": "landscape"}))]
pub struct SearchOptions(BTreeMap<String, String>);

impl SearchOptions {
    /// Create an empty set of options
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an option
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up an option value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Look up an option value, falling back to `default`
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Requested media type (`image`, `video`, `all`, ...)
    pub fn media_type(&self) -> Option<&str> {
        self.get("type")
    }

    /// Overlay these options on top of `defaults`
    #[must_use]
    pub fn merged_over(&self, defaults: &SearchOptions) -> SearchOptions {
        let mut merged = defaults.0.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        SearchOptions(merged)
    }

    /// Iterate over the options in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether no option is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SearchOptions
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_options_override_defaults() {
        let defaults = SearchOptions::new()
            .with("type", "image")
            .with("orientation", "landscape");
        let request = SearchOptions::new().with("type", "video");

        let merged = request.merged_over(&defaults);
        assert_eq!(merged.media_type(), Some("video"));
        assert_eq!(merged.get("orientation"), Some("landscape"));
    }

    #[test]
    fn serialization_is_sorted() {
        let options: SearchOptions = [("type", "image"), ("orientation", "portrait")]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"orientation":"portrait","type":"image"}"#);
    }

    #[test]
    fn get_or_falls_back() {
        let options = SearchOptions::new();
        assert_eq!(options.get_or("file_type", "all"), "all");
        assert!(options.is_empty());
    }
}
