//! Backend interface for page content.
//!
//! [`ContentStore`] names the create/read/update and filter primitives the
//! synchronization layer needs over the `pages`, `page_sections`,
//! `content_versions` and `admin_activity_logs` collections.
//! [`PgContentStore`] is the production implementation; [`InMemoryStore`]
//! enforces the same constraints without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use pagewright_core::page_path::PagePath;
use pagewright_core::types::DbId;
use pagewright_db::models::activity_log::{ActivityLog, CreateActivityLog};
use pagewright_db::models::content_version::{ContentVersion, CreateContentVersion};
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use uuid::Uuid;

use crate::error::BackendError;

pub use memory::{InMemoryStore, StoreOp};
pub use postgres::PgContentStore;

/// Who is writing: the admin user recorded on the row, and the writer id
/// carried on the resulting change notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<DbId>,
    pub origin: Option<Uuid>,
}

impl Actor {
    pub fn user(user_id: DbId) -> Self {
        Self {
            user_id: Some(user_id),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Uuid) -> Self {
        self.origin = Some(origin);
        self
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn find_page(&self, path: &PagePath) -> Result<Option<PageRecord>, BackendError>;

    async fn list_pages(&self) -> Result<Vec<PageRecord>, BackendError>;

    /// A page's sections in display order.
    async fn list_sections(
        &self,
        path: &PagePath,
        include_inactive: bool,
    ) -> Result<Vec<PageSection>, BackendError>;

    /// Every active section across all pages, ordered by path then display
    /// order.
    async fn list_active_sections(&self) -> Result<Vec<PageSection>, BackendError>;

    async fn find_section(&self, id: DbId) -> Result<Option<PageSection>, BackendError>;

    /// Create or update a page in one atomic request.
    async fn upsert_page(
        &self,
        path: &PagePath,
        input: &UpdatePage,
        actor: &Actor,
    ) -> Result<PageRecord, BackendError>;

    async fn insert_section(
        &self,
        input: &CreatePageSection,
        actor: &Actor,
    ) -> Result<PageSection, BackendError>;

    async fn update_section(
        &self,
        id: DbId,
        input: &UpdatePageSection,
        actor: &Actor,
    ) -> Result<Option<PageSection>, BackendError>;

    /// Returns `true` if the flag changed.
    async fn set_section_active(
        &self,
        id: DbId,
        active: bool,
        actor: &Actor,
    ) -> Result<bool, BackendError>;

    /// Highest version number stored for `path`, `0` if none.
    async fn latest_version_number(&self, path: &PagePath) -> Result<i32, BackendError>;

    async fn insert_version(
        &self,
        input: &CreateContentVersion,
    ) -> Result<ContentVersion, BackendError>;

    /// Versions of `path`, newest first.
    async fn list_versions(&self, path: &PagePath) -> Result<Vec<ContentVersion>, BackendError>;

    async fn record_activity(
        &self,
        entry: &CreateActivityLog,
    ) -> Result<ActivityLog, BackendError>;

    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityLog>, BackendError>;
}
