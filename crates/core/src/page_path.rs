//! Site page paths.
//!
//! Every page record is keyed by its public path (`/`, `/about`,
//! `/services/seo`). [`PagePath`] is the only way to name a page across the
//! workspace, so a value of this type is always well-formed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a page path in bytes.
pub const MAX_PATH_LEN: usize = 255;

/// A validated, normalized page path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PagePath(String);

impl PagePath {
    /// Parse and validate a page path.
    ///
    /// Rules: starts with `/`, at most [`MAX_PATH_LEN`] bytes, segments are
    /// non-empty and contain only `a-z`, `0-9`, `-` and `_`, and only the
    /// root path may end with `/`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() {
            return Err(CoreError::Validation("Page path must not be empty".into()));
        }
        if raw.len() > MAX_PATH_LEN {
            return Err(CoreError::Validation(format!(
                "Page path must be at most {MAX_PATH_LEN} bytes"
            )));
        }
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(CoreError::Validation(format!(
                "Page path '{raw}' must start with '/'"
            )));
        };
        if rest.is_empty() {
            return Ok(Self::root());
        }
        for segment in rest.split('/') {
            if segment.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Page path '{raw}' contains an empty segment"
                )));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
            {
                return Err(CoreError::Validation(format!(
                    "Page path segment '{segment}' may only contain a-z, 0-9, '-' and '_'"
                )));
            }
        }
        Ok(Self(raw.to_string()))
    }

    /// The site root, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PagePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PagePath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PagePath> for String {
    fn from(path: PagePath) -> Self {
        path.0
    }
}

impl std::str::FromStr for PagePath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
