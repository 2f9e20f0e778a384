// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Non-empty string values for provider settings
//!
//! Base URLs, user agents and API keys are stored as [`NonEmptyString`], so a
//! provider config that exists is known to carry usable values. Optional
//! credentials are modelled as `Option<NonEmptyString>`, where a blank key
//! from a configuration file becomes `None`.
//!
//! ```rust
//! use external_apis::NonEmptyString;
//!
//! let base_url = NonEmptyString::new("https://pixabay.com").unwrap();
//! assert_eq!(base_url.as_str(), "https://pixabay.com");
//!
//! let api_key = NonEmptyString::new("   ").ok();
//! assert!(api_key.is_none());
//! ```

use std::{fmt, str::FromStr};

/// A string with at least one non-whitespace character
///
/// Leading and trailing whitespace is kept as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyString(Box<str>);

impl NonEmptyString {
    /// Validate and wrap `s`
    ///
    /// # Errors
    ///
    /// Returns a message if `s` is empty or whitespace-only
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.trim().is_empty() {
            Err("String cannot be empty or whitespace-only".to_string())
        } else {
            Ok(NonEmptyString(s.into_boxed_str()))
        }
    }

    /// Borrow the value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NonEmptyString {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_values() {
        assert!(NonEmptyString::new("").is_err());
        assert!(NonEmptyString::new(" \t\n").is_err());
        assert!("".parse::<NonEmptyString>().is_err());
    }

    #[test]
    fn keeps_value_as_given() {
        let user_agent = NonEmptyString::new(" Asset Import Bot/1.0 ").unwrap();
        assert_eq!(user_agent.as_str(), " Asset Import Bot/1.0 ");
        assert_eq!(user_agent.to_string(), " Asset Import Bot/1.0 ");

        let key: NonEmptyString = "563492ad6f917".parse().unwrap();
        assert_eq!(key.as_ref(), "563492ad6f917");
    }
}
