//! Content and SEO synchronization layer.
//!
//! - [`store`]: the [`ContentStore`] backend interface with Postgres and
//!   in-memory implementations.
//! - [`resource`]: request/response wrappers per resource type.
//! - [`ContentManager`]: owns the working copy of the page being edited and
//!   applies optimistic mutations through [`command`] objects.
//! - [`ChangeBridge`]: reloads the edited page when another actor changes it.
//! - [`SeoCache`]: read-through cache of default-backfilled SEO metadata.

pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod manager;
pub mod notice;
pub mod resource;
pub mod seo_cache;
pub mod store;

pub use bridge::ChangeBridge;
pub use config::ContentConfig;
pub use error::{BackendError, ContentError};
pub use manager::{ContentManager, EditorSnapshot, EditorState, NewSection};
pub use notice::{Notice, NoticeLevel};
pub use resource::PageContent;
pub use seo_cache::SeoCache;
pub use store::{Actor, ContentStore, InMemoryStore, PgContentStore, StoreOp};
