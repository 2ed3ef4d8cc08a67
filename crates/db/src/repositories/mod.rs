//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod activity_log_repo;
pub mod content_version_repo;
pub mod form_submission_repo;
pub mod page_repo;
pub mod page_section_repo;

pub use activity_log_repo::ActivityLogRepo;
pub use content_version_repo::ContentVersionRepo;
pub use form_submission_repo::FormSubmissionRepo;
pub use page_repo::PageRepo;
pub use page_section_repo::PageSectionRepo;
