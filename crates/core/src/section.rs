//! Page section types and key rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a section key.
pub const MAX_SECTION_KEY_LEN: usize = 64;

/// Gap left between consecutive display orders when appending sections,
/// so a section can later be slotted in between without renumbering.
pub const DISPLAY_ORDER_STEP: i32 = 10;

/// The fixed set of renderable section kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Hero,
    Text,
    List,
    Features,
    Testimonials,
    Faq,
    Services,
}

impl SectionType {
    pub const ALL: [SectionType; 7] = [
        Self::Hero,
        Self::Text,
        Self::List,
        Self::Features,
        Self::Testimonials,
        Self::Faq,
        Self::Services,
    ];

    /// String representation used in the database and over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Text => "text",
            Self::List => "list",
            Self::Features => "features",
            Self::Testimonials => "testimonials",
            Self::Faq => "faq",
            Self::Services => "services",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SectionType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid section type '{value}'. Must be one of: {}",
                    Self::ALL.map(|t| t.as_str()).join(", ")
                ))
            })
    }
}

/// Validate a section key: lowercase alphanumeric start, then
/// alphanumerics, `-` or `_`, at most [`MAX_SECTION_KEY_LEN`] characters.
pub fn validate_section_key(key: &str) -> Result<(), CoreError> {
    let re = regex::Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$")
        .map_err(|e| CoreError::Internal(e.to_string()))?;
    if re.is_match(key) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid section key '{key}'. Use lowercase letters, digits, '-' or '_' \
             (max {MAX_SECTION_KEY_LEN} characters)"
        )))
    }
}

/// Display order for a section appended after `existing` active orders.
pub fn next_display_order(existing: impl IntoIterator<Item = i32>) -> i32 {
    existing
        .into_iter()
        .max()
        .map(|max| max + DISPLAY_ORDER_STEP)
        .unwrap_or(0)
}
