// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider settings as read from configuration files
//!
//! Every field has a default, so a configuration that names no provider
//! still yields a registry with all built-in providers, most of them
//! unconfigured until a key is supplied.

use serde::{Deserialize, Serialize};

use crate::{
    PexelsConfig, PixabayConfig, UnsplashConfig, WikimediaConfig,
    pexels::{DEFAULT_PEXELS_BASE_URL, DEFAULT_PEXELS_TIMEOUT_SECONDS},
    pixabay::{DEFAULT_PIXABAY_BASE_URL, DEFAULT_PIXABAY_TIMEOUT_SECONDS},
    unsplash::{DEFAULT_UNSPLASH_BASE_URL, DEFAULT_UNSPLASH_TIMEOUT_SECONDS},
    wikimedia::{
        DEFAULT_WIKIMEDIA_API_URL, DEFAULT_WIKIMEDIA_TIMEOUT_SECONDS, DEFAULT_WIKIMEDIA_USER_AGENT,
    },
};

/// Settings for all built-in providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Pixabay settings
    pub pixabay: PixabaySettings,
    /// Pexels settings
    pub pexels: PexelsSettings,
    /// Unsplash settings
    pub unsplash: UnsplashSettings,
    /// Wikimedia Commons settings
    pub wikimedia: WikimediaSettings,
}

/// Pixabay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct PixabaySettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for PixabaySettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_PIXABAY_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_PIXABAY_TIMEOUT_SECONDS,
        }
    }
}

impl TryFrom<&PixabaySettings> for PixabayConfig {
    type Error = String;

    fn try_from(value: &PixabaySettings) -> Result<Self, Self::Error> {
        PixabayConfig::new(&value.api_key, &value.base_url, value.timeout_seconds)
    }
}

/// Pexels settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct PexelsSettings {
    pub api_key: String,
    /// `photographer_pexels`, `photographer` or `pexels`
    pub copyright_fields: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for PexelsSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            copyright_fields: String::new(),
            base_url: DEFAULT_PEXELS_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_PEXELS_TIMEOUT_SECONDS,
        }
    }
}

impl TryFrom<&PexelsSettings> for PexelsConfig {
    type Error = String;

    fn try_from(value: &PexelsSettings) -> Result<Self, Self::Error> {
        PexelsConfig::new(
            &value.api_key,
            &value.copyright_fields,
            &value.base_url,
            value.timeout_seconds,
        )
    }
}

/// Unsplash settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct UnsplashSettings {
    pub access_key: String,
    /// `photographer_unsplash`, `photographer` or `unsplash`
    pub copyright_fields: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for UnsplashSettings {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            copyright_fields: String::new(),
            base_url: DEFAULT_UNSPLASH_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_UNSPLASH_TIMEOUT_SECONDS,
        }
    }
}

impl TryFrom<&UnsplashSettings> for UnsplashConfig {
    type Error = String;

    fn try_from(value: &UnsplashSettings) -> Result<Self, Self::Error> {
        UnsplashConfig::new(
            &value.access_key,
            &value.copyright_fields,
            &value.base_url,
            value.timeout_seconds,
        )
    }
}

/// Wikimedia Commons settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct WikimediaSettings {
    pub user_agent: String,
    /// `author_wikimedia`, `author`, `wikimedia` or `license`
    pub copyright_fields: String,
    pub set_copyright: bool,
    /// `api.php` endpoint
    pub api_url: String,
    pub timeout_seconds: u64,
}

impl Default for WikimediaSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_WIKIMEDIA_USER_AGENT.to_string(),
            copyright_fields: String::new(),
            set_copyright: false,
            api_url: DEFAULT_WIKIMEDIA_API_URL.to_string(),
            timeout_seconds: DEFAULT_WIKIMEDIA_TIMEOUT_SECONDS,
        }
    }
}

impl TryFrom<&WikimediaSettings> for WikimediaConfig {
    type Error = String;

    fn try_from(value: &WikimediaSettings) -> Result<Self, Self::Error> {
        WikimediaConfig::new(
            &value.user_agent,
            &value.copyright_fields,
            value.set_copyright,
            &value.api_url,
            value.timeout_seconds,
        )
    }
}
