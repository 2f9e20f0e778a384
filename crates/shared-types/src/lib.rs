// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the asset import service
//!
//! This crate provides common types that are shared across multiple crates
//! in the asset import workspace, avoiding circular dependencies.

pub mod asset_type;
pub mod file_size;

pub use asset_type::{AssetType, AssetTypeParseError};
pub use file_size::format_file_size;
