//! Field descriptor, rule and violation types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single constraint attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// String length in characters must not exceed the limit.
    MaxChars(usize),
    /// String length in characters must be at least the limit.
    MinChars(usize),
    /// Absolute `http`/`https` URL, or the empty string.
    AbsoluteUrl,
    /// Syntactically valid email address.
    Email,
    /// Value must be one of the listed strings.
    OneOf(&'static [&'static str]),
    /// Comma-separated list whose trimmed items are all in the given set.
    TokenList(&'static [&'static str]),
    /// Whole-string regex match.
    Pattern(&'static str),
    /// Array may hold at most this many items.
    MaxItems(usize),
    /// Every string item of an array must not exceed this many characters.
    ItemMaxChars(usize),
}

impl FieldRule {
    /// Stable machine-readable rule name reported in violations.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MaxChars(_) => "max_length",
            Self::MinChars(_) => "min_length",
            Self::AbsoluteUrl => "absolute_url",
            Self::Email => "email",
            Self::OneOf(_) => "enum_values",
            Self::TokenList(_) => "token_list",
            Self::Pattern(_) => "regex_pattern",
            Self::MaxItems(_) => "max_items",
            Self::ItemMaxChars(_) => "item_max_length",
        }
    }
}

/// Static description of one form or metadata field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// JSON key of the field.
    pub name: &'static str,
    /// Human-readable label used in messages.
    pub label: &'static str,
    /// Whether a non-empty value must be present.
    pub required: bool,
    /// Constraints applied when a value is present.
    pub rules: &'static [FieldRule],
}

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// One or more field violations. A write carrying any violation is rejected
/// as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// An error carrying exactly one violation.
    pub fn single(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                rule: rule.into(),
                message: message.into(),
            }],
        }
    }

    /// Whether a violation was reported for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// The first violation reported for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&FieldViolation> {
        self.violations.iter().find(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "validation failed ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}
