// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Filename sanitizing and extension helpers
//!
//! Provider imports turn free text titles into safe stems with
//! [`sanitize_stem`]. Filenames that already carry an extension (Wikimedia
//! Commons files, direct URL imports) go through [`sanitize_filename`],
//! which keeps dots.

use std::{path::Path, sync::LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

/// Stem used when sanitizing leaves nothing behind
pub const FALLBACK_STEM: &str = "import";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug regex is valid"));

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("filename regex is valid"));

static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("underscore regex is valid"));

/// Lowercase, transliterate German umlauts and replace every other run of
/// non alphanumeric characters with a single underscore
pub fn normalize(value: &str) -> String {
    let mut transliterated = String::with_capacity(value.len());
    for c in value.to_lowercase().chars() {
        match c {
            'ä' => transliterated.push_str("ae"),
            'ö' => transliterated.push_str("oe"),
            'ü' => transliterated.push_str("ue"),
            'ß' => transliterated.push_str("ss"),
            other => transliterated.push(other),
        }
    }

    NON_ALPHANUMERIC
        .replace_all(&transliterated, "_")
        .into_owned()
}

/// Turn a title into a filename stem (no extension)
pub fn sanitize_stem(value: &str) -> String {
    let normalized = normalize(value);
    non_empty(normalized.trim_matches('_'))
}

/// Sanitize a filename that may already include an extension
///
/// Characters outside `[a-zA-Z0-9._-]` become underscores, runs of
/// underscores collapse and leading or trailing underscores and dots are
/// removed.
pub fn sanitize_filename(value: &str) -> String {
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(value.trim(), "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    non_empty(collapsed.trim_matches(|c| c == '_' || c == '.'))
}

fn non_empty(value: &str) -> String {
    if value.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        value.to_string()
    }
}

/// Extension of the last path segment of `url`, lowercased
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let (_, extension) = segment.rsplit_once('.')?;

    if extension.is_empty()
        || extension.len() > 5
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

/// Last path segment of `url`, percent-decoded, if it is not empty
pub fn basename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let name = decoded.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Whether `filename` already carries an extension
pub fn has_extension(filename: &str) -> bool {
    Path::new(filename).extension().is_some()
}

/// Append `extension` to `stem`
pub fn with_extension(stem: &str, extension: &str) -> String {
    format!("{stem}.{}", extension.trim_start_matches('.'))
}

/// Filename without its extension, used as the media title
pub fn stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// File extension for a supported MIME type
pub fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/ogg" => Some("ogg"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// MIME type guessed from a filename extension
pub fn mime_for_filename(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg" | "ogv") => "video/ogg",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Whether `filename` is a plain name that stays inside the media directory
pub fn is_safe(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\'])
        && !filename.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_from_title() {
        assert_eq!(sanitize_stem("Mountain Lake, Sunset!"), "mountain_lake_sunset");
        assert_eq!(sanitize_stem("Grüße aus Köln"), "gruesse_aus_koeln");
        assert_eq!(sanitize_stem("  --  "), FALLBACK_STEM);
        assert_eq!(sanitize_stem("tree-photo"), "tree_photo");
    }

    #[test]
    fn filename_keeps_extension() {
        assert_eq!(
            sanitize_filename("Sunset over (the) sea.jpg"),
            "Sunset_over_the_sea.jpg"
        );
        assert_eq!(sanitize_filename("__a___b__.png"), "a_b_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("???"), FALLBACK_STEM);
    }

    #[test]
    fn url_extension() {
        assert_eq!(
            extension_from_url("https://images.pexels.com/photos/1/pexels-photo-1.JPEG?auto=compress"),
            Some("jpeg".to_string())
        );
        assert_eq!(extension_from_url("https://player.vimeo.com/external/123"), None);
        assert_eq!(extension_from_url("not a url"), None);
        assert_eq!(extension_from_url("https://example.com/archive.tar.gz.backup1"), None);
    }

    #[test]
    fn url_basename() {
        assert_eq!(
            basename_from_url("https://example.com/media/photo.png"),
            Some("photo.png".to_string())
        );
        assert_eq!(basename_from_url("https://example.com/"), None);
        assert_eq!(
            basename_from_url("https://example.com/media/my%20photo%C3%A9.jpg").as_deref(),
            Some("my photoé.jpg")
        );
        assert_eq!(
            basename_from_url("https://example.com/a/..%2Fescape.png").as_deref(),
            Some("escape.png")
        );
    }

    #[test]
    fn extension_helpers() {
        assert!(has_extension("photo.jpg"));
        assert!(!has_extension("photo"));
        assert_eq!(with_extension("photo", ".png"), "photo.png");
        assert_eq!(stem("photo.final.jpg"), "photo.final");
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(extension_for_mime("image/jpg"), Some("jpg"));
        assert_eq!(extension_for_mime("video/ogg"), Some("ogg"));
        assert_eq!(extension_for_mime("text/html"), None);
        assert_eq!(mime_for_filename("clip.MP4"), "video/mp4");
        assert_eq!(mime_for_filename("archive"), "application/octet-stream");
    }

    #[test]
    fn safe_names() {
        assert!(is_safe("photo.jpg"));
        assert!(!is_safe("../photo.jpg"));
        assert!(!is_safe(".hidden"));
        assert!(!is_safe(""));
    }
}
