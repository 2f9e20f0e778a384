// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Asset type classification
//!
//! Every item a provider returns is classified as an image, a video, or a
//! generic file (documents such as PDFs from Wikimedia Commons).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Kind of media an asset represents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// Still image (jpeg, png, webp, svg, ...)
    Image,
    /// Video clip
    Video,
    /// Any other downloadable file
    File,
}

/// Error returned when parsing an unknown asset type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown asset type: {0}")]
pub struct AssetTypeParseError(pub String);

impl AssetType {
    /// Returns the lowercase identifier used on the wire and in search options
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::File => "file",
        }
    }

    /// Classify a MIME type, falling back to [`AssetType::File`]
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::File
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = AssetTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "file" => Ok(Self::File),
            _ => Err(AssetTypeParseError(s.to_string())),
        }
    }
}
