//! Pure domain logic for the pagewright content layer.
//!
//! Nothing in this crate performs I/O. The database, event and HTTP crates
//! build on these types and rules.

pub mod error;
pub mod forms;
pub mod page_path;
pub mod section;
pub mod seo;
pub mod types;
pub mod validation;
