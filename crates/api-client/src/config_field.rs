// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider configuration metadata
//!
//! Providers describe the settings they need (API keys, attribution style,
//! user agents) as a list of [`ConfigField`]s. The registry validates these
//! descriptions when a provider is registered.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Input widget kind for a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    Text,
    /// Secret value
    Password,
    /// One of a fixed list of options
    Select,
}

/// Selectable value of a [`FieldType::Select`] field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelectOption {
    /// Display label
    pub label: String,
    /// Stored value
    pub value: String,
}

/// Description of one provider setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConfigField {
    /// Setting key
    pub name: String,
    /// Display label
    pub label: String,
    /// Input widget kind
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Optional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Choices for select fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

/// Reasons a config field description is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ConfigFieldError {
    #[error("config field is missing a name")]
    MissingName,

    #[error("config field '{name}' is missing a label")]
    MissingLabel { name: String },

    #[error("select field '{name}' has no options")]
    EmptySelect { name: String },
}

impl ConfigField {
    fn new(name: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            notice: None,
            options: Vec::new(),
        }
    }

    /// Free text field
    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldType::Text)
    }

    /// Secret field
    pub fn password(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldType::Password)
    }

    /// Select field with `(label, value)` choices
    pub fn select(name: &str, label: &str, options: &[(&str, &str)]) -> Self {
        let mut field = Self::new(name, label, FieldType::Select);
        field.options = options
            .iter()
            .map(|(label, value)| SelectOption {
                label: (*label).to_string(),
                value: (*value).to_string(),
            })
            .collect();
        field
    }

    /// Attach help text
    #[must_use]
    pub fn with_notice(mut self, notice: &str) -> Self {
        self.notice = Some(notice.to_string());
        self
    }

    /// Check that the description is complete
    pub fn validate(&self) -> Result<(), ConfigFieldError> {
        if self.name.trim().is_empty() {
            return Err(ConfigFieldError::MissingName);
        }
        if self.label.trim().is_empty() {
            return Err(ConfigFieldError::MissingLabel {
                name: self.name.clone(),
            });
        }
        if self.field_type == FieldType::Select && self.options.is_empty() {
            return Err(ConfigFieldError::EmptySelect {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_fields() {
        assert!(ConfigField::text("useragent", "User agent").validate().is_ok());
        assert!(
            ConfigField::select("set_copyright", "Set copyright", &[("No", "0"), ("Yes", "1")])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn invalid_fields() {
        assert_eq!(
            ConfigField::text(" ", "Label").validate(),
            Err(ConfigFieldError::MissingName)
        );
        assert!(matches!(
            ConfigField::password("apikey", "").validate(),
            Err(ConfigFieldError::MissingLabel { .. })
        ));
        assert!(matches!(
            ConfigField::select("mode", "Mode", &[]).validate(),
            Err(ConfigFieldError::EmptySelect { .. })
        ));
    }

    #[test]
    fn serializes_type_key() {
        let field = ConfigField::password("apikey", "API key").with_notice("Get a key first");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "password");
        assert_eq!(json["notice"], "Get a key first");
        assert!(json.get("options").is_none());
    }
}
