//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create / update DTOs where the table is writable

pub mod activity_log;
pub mod content_version;
pub mod form_submission;
pub mod page;
pub mod page_section;
