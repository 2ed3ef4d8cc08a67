//! Public form schemas.
//!
//! A form is a static table of [`FieldDescriptor`]s. A [`ContactFormConfig`]
//! of enable flags selects which optional descriptors are active, and the
//! generic evaluator validates a submission against the selection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::validation::{validate_fields, FieldDescriptor, FieldRule, ValidationError};

/// Form name stored with contact submissions.
pub const CONTACT_FORM: &str = "contact";

/// Submission workflow states.
pub const SUBMISSION_STATUSES: &[&str] = &["new", "read", "archived"];

const NAME: FieldDescriptor = FieldDescriptor {
    name: "name",
    label: "Name",
    required: true,
    rules: &[FieldRule::MinChars(2), FieldRule::MaxChars(100)],
};

const EMAIL: FieldDescriptor = FieldDescriptor {
    name: "email",
    label: "Email",
    required: true,
    rules: &[FieldRule::Email, FieldRule::MaxChars(254)],
};

const PHONE: FieldDescriptor = FieldDescriptor {
    name: "phone",
    label: "Phone",
    required: false,
    rules: &[FieldRule::Pattern(r"^\+?[0-9 ()-]{7,20}$")],
};

const COMPANY: FieldDescriptor = FieldDescriptor {
    name: "company",
    label: "Company",
    required: false,
    rules: &[FieldRule::MaxChars(120)],
};

const SERVICE: FieldDescriptor = FieldDescriptor {
    name: "service",
    label: "Service",
    required: false,
    rules: &[FieldRule::OneOf(&[
        "seo",
        "ppc",
        "social",
        "content",
        "web_design",
        "analytics",
        "other",
    ])],
};

const BUDGET: FieldDescriptor = FieldDescriptor {
    name: "budget",
    label: "Budget",
    required: false,
    rules: &[FieldRule::OneOf(&[
        "under_5k",
        "5k_15k",
        "15k_50k",
        "over_50k",
    ])],
};

const MESSAGE: FieldDescriptor = FieldDescriptor {
    name: "message",
    label: "Message",
    required: true,
    rules: &[FieldRule::MinChars(10), FieldRule::MaxChars(5000)],
};

/// Enable flags for the optional contact form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFormConfig {
    pub show_phone: bool,
    pub show_company: bool,
    pub show_service: bool,
    pub show_budget: bool,
}

impl Default for ContactFormConfig {
    fn default() -> Self {
        Self {
            show_phone: true,
            show_company: true,
            show_service: true,
            show_budget: false,
        }
    }
}

impl ContactFormConfig {
    /// The active descriptor table, in display order.
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        let optional = [
            (self.show_phone, PHONE),
            (self.show_company, COMPANY),
            (self.show_service, SERVICE),
            (self.show_budget, BUDGET),
        ];

        let mut fields = vec![NAME, EMAIL];
        fields.extend(optional.into_iter().filter(|(on, _)| *on).map(|(_, d)| d));
        fields.push(MESSAGE);
        fields
    }

    /// Validate a submission and return it reduced to the active fields,
    /// with string values trimmed and empty optional values dropped.
    pub fn clean(&self, submission: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let descriptors = self.descriptors();

        let trimmed: Map<String, Value> = submission
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k.clone(), Value::String(s.trim().to_string())),
                other => (k.clone(), other.clone()),
            })
            .collect();

        validate_fields(&descriptors, &trimmed)?;

        Ok(descriptors
            .iter()
            .filter_map(|d| {
                trimmed
                    .get(d.name)
                    .filter(|v| !v.is_null() && v.as_str() != Some(""))
                    .map(|v| (d.name.to_string(), v.clone()))
            })
            .collect())
    }
}

/// Validate a submission status value.
pub fn validate_submission_status(status: &str) -> Result<(), CoreError> {
    if SUBMISSION_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid submission status '{status}'. Must be one of: {}",
            SUBMISSION_STATUSES.join(", ")
        )))
    }
}
