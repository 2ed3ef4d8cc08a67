//! Descriptor evaluator. Pure logic, no database access.

use regex::Regex;
use serde_json::{Map, Value};
use validator::{ValidateEmail, ValidateUrl};

use super::rules::{FieldDescriptor, FieldRule, FieldViolation, ValidationError};

/// Validate `data` against every descriptor in `descriptors`.
///
/// Absent, `null` and empty-string values only fail the `required` check;
/// all other rules apply to present values. Keys in `data` without a
/// descriptor are ignored.
pub fn validate_fields(
    descriptors: &[FieldDescriptor],
    data: &Map<String, Value>,
) -> Result<(), ValidationError> {
    let violations = evaluate_fields(descriptors, data);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

/// Collect every violation without short-circuiting.
pub fn evaluate_fields(
    descriptors: &[FieldDescriptor],
    data: &Map<String, Value>,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    for descriptor in descriptors {
        let value = match data.get(descriptor.name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        };

        let Some(value) = value else {
            if descriptor.required {
                violations.push(FieldViolation {
                    field: descriptor.name.to_string(),
                    rule: "required".to_string(),
                    message: format!("{} is required", descriptor.label),
                });
            }
            continue;
        };

        for rule in descriptor.rules {
            if let Some(message) = evaluate_rule(rule, descriptor, value) {
                violations.push(FieldViolation {
                    field: descriptor.name.to_string(),
                    rule: rule.name().to_string(),
                    message,
                });
            }
        }
    }

    violations
}

fn evaluate_rule(rule: &FieldRule, descriptor: &FieldDescriptor, value: &Value) -> Option<String> {
    let label = descriptor.label;
    match rule {
        FieldRule::MaxItems(max) => {
            let items = value.as_array()?;
            (items.len() > *max).then(|| format!("{label} may contain at most {max} items"))
        }
        FieldRule::ItemMaxChars(max) => {
            let items = value.as_array()?;
            items
                .iter()
                .filter_map(|i| i.as_str())
                .any(|s| s.chars().count() > *max)
                .then(|| format!("Each {label} entry must be at most {max} characters"))
        }
        _ => {
            let Some(s) = value.as_str() else {
                return Some(format!("{label} must be text"));
            };
            evaluate_string_rule(rule, label, s)
        }
    }
}

fn evaluate_string_rule(rule: &FieldRule, label: &str, s: &str) -> Option<String> {
    match rule {
        FieldRule::MaxChars(max) => (s.chars().count() > *max)
            .then(|| format!("{label} must be at most {max} characters")),
        FieldRule::MinChars(min) => (s.chars().count() < *min)
            .then(|| format!("{label} must be at least {min} characters")),
        FieldRule::AbsoluteUrl => (!is_absolute_http_url(s))
            .then(|| format!("{label} must be an absolute http(s) URL")),
        FieldRule::Email => {
            (!s.validate_email()).then(|| format!("{label} must be a valid email address"))
        }
        FieldRule::OneOf(allowed) => (!allowed.contains(&s))
            .then(|| format!("{label} must be one of: {}", allowed.join(", "))),
        FieldRule::TokenList(allowed) => {
            let unknown: Vec<&str> = s
                .split(',')
                .map(str::trim)
                .filter(|t| !allowed.contains(t))
                .collect();
            (!unknown.is_empty()).then(|| {
                format!(
                    "{label} contains unknown entries: {}",
                    unknown.join(", ")
                )
            })
        }
        FieldRule::Pattern(pattern) => match Regex::new(pattern) {
            Ok(re) if re.is_match(s) => None,
            Ok(_) => Some(format!("{label} has an invalid format")),
            Err(_) => None, // Invalid pattern in the table passes
        },
        FieldRule::MaxItems(_) | FieldRule::ItemMaxChars(_) => None,
    }
}

fn is_absolute_http_url(s: &str) -> bool {
    (s.starts_with("http://") || s.starts_with("https://")) && s.validate_url()
}
