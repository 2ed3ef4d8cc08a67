//! Declarative field validation.
//!
//! Forms and SEO metadata describe their fields as static
//! [`FieldDescriptor`] tables; [`validate_fields`] interprets any such table
//! against a JSON object. No database access.

pub mod evaluator;
pub mod rules;

pub use evaluator::validate_fields;
pub use rules::{FieldDescriptor, FieldRule, FieldViolation, ValidationError};
