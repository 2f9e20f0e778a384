// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! [`JsonExtractor`] replaces axum's `Json` for request bodies and answers
//! malformed input with a `400` that says what is wrong, instead of axum's
//! plain-text rejections.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::ServerError;

mod hints {
    pub const EMPTY_BODY: &str = "request body is empty, expected valid JSON";
    pub const TRUNCATED: &str = "unexpected end of JSON input, request appears to be truncated";
    pub const MISSING_COMMA: &str =
        "check for missing or extra commas between object properties or array elements";
    pub const UNCLOSED: &str = "check for a missing closing brace or bracket";
    pub const EXPECTED_VALUE: &str =
        "expected a valid JSON value (string, number, boolean, null, object, or array)";
    pub const SYNTAX: &str = "check JSON formatting and structure";
    pub const OPTION_VALUES: &str = "search options map names to string values";
    pub const PAGE: &str = "page must be a positive integer";
}

const MAX_JSON_PAYLOAD_SIZE: usize = 64 * 1024;

/// JSON body extractor with descriptive rejections
#[derive(Debug)]
pub struct JsonExtractor<T>(pub T);

impl<T, S> FromRequest<S> for JsonExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get(header::CONTENT_TYPE)
            && let Ok(content_type) = content_type.to_str()
            && !content_type.starts_with("application/json")
        {
            return Err(json_error(format!(
                "invalid content-type: expected 'application/json', got '{content_type}'"
            )));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| json_error(format!("failed to read request body: {rejection}")))?;

        if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
            return Err(json_error(format!(
                "request body too large: {} bytes (max: {MAX_JSON_PAYLOAD_SIZE} bytes)",
                bytes.len()
            )));
        }
        if bytes.is_empty() {
            return Err(json_error(hints::EMPTY_BODY));
        }

        serde_json::from_slice::<T>(&bytes)
            .map(JsonExtractor)
            .map_err(|err| json_error(describe(&err)))
    }
}

fn json_error(message: impl Into<String>) -> ServerError {
    ServerError::JsonError {
        message: message.into(),
    }
}

fn describe(err: &serde_json::Error) -> String {
    if err.is_eof() {
        hints::TRUNCATED.to_string()
    } else if err.is_syntax() {
        format!(
            "invalid JSON syntax at line {}, column {}: {}",
            err.line(),
            err.column(),
            syntax_hint(&err.to_string())
        )
    } else if err.is_data() {
        format!("JSON data validation failed: {}", data_hint(&err.to_string()))
    } else {
        format!("JSON parsing error: {err}")
    }
}

fn syntax_hint(message: &str) -> &'static str {
    if message.contains("expected `,`") || message.contains("trailing comma") {
        hints::MISSING_COMMA
    } else if message.contains("expected `}`") || message.contains("expected `]`") {
        hints::UNCLOSED
    } else if message.contains("expected value") {
        hints::EXPECTED_VALUE
    } else {
        hints::SYNTAX
    }
}

fn data_hint(message: &str) -> String {
    if message.contains("invalid type") && message.contains("a string") {
        format!("{message} ({})", hints::OPTION_VALUES)
    } else if message.contains("u32") || message.contains("invalid value: integer") {
        format!("{message} ({})", hints::PAGE)
    } else if message.contains("missing field") {
        format!("required field is missing: {message}")
    } else {
        message.to_string()
    }
}
