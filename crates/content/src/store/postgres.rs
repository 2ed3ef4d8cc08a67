//! [`ContentStore`] over PostgreSQL via the repository layer.

use async_trait::async_trait;
use pagewright_core::page_path::PagePath;
use pagewright_core::types::DbId;
use pagewright_db::models::activity_log::{ActivityLog, CreateActivityLog};
use pagewright_db::models::content_version::{ContentVersion, CreateContentVersion};
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use pagewright_db::repositories::{
    ActivityLogRepo, ContentVersionRepo, PageRepo, PageSectionRepo,
};
use pagewright_db::DbPool;

use super::{Actor, ContentStore};
use crate::error::BackendError;

#[derive(Clone)]
pub struct PgContentStore {
    pool: DbPool,
}

impl PgContentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn find_page(&self, path: &PagePath) -> Result<Option<PageRecord>, BackendError> {
        Ok(PageRepo::find_by_path(&self.pool, path).await?)
    }

    async fn list_pages(&self) -> Result<Vec<PageRecord>, BackendError> {
        Ok(PageRepo::list(&self.pool).await?)
    }

    async fn list_sections(
        &self,
        path: &PagePath,
        include_inactive: bool,
    ) -> Result<Vec<PageSection>, BackendError> {
        Ok(PageSectionRepo::list_by_page(&self.pool, path, include_inactive).await?)
    }

    async fn list_active_sections(&self) -> Result<Vec<PageSection>, BackendError> {
        Ok(PageSectionRepo::list_active(&self.pool).await?)
    }

    async fn find_section(&self, id: DbId) -> Result<Option<PageSection>, BackendError> {
        Ok(PageSectionRepo::find_by_id(&self.pool, id).await?)
    }

    async fn upsert_page(
        &self,
        path: &PagePath,
        input: &UpdatePage,
        actor: &Actor,
    ) -> Result<PageRecord, BackendError> {
        Ok(PageRepo::upsert(&self.pool, path, input, actor.user_id, actor.origin).await?)
    }

    async fn insert_section(
        &self,
        input: &CreatePageSection,
        actor: &Actor,
    ) -> Result<PageSection, BackendError> {
        Ok(PageSectionRepo::create(&self.pool, input, actor.origin).await?)
    }

    async fn update_section(
        &self,
        id: DbId,
        input: &UpdatePageSection,
        actor: &Actor,
    ) -> Result<Option<PageSection>, BackendError> {
        Ok(PageSectionRepo::update(&self.pool, id, input, actor.origin).await?)
    }

    async fn set_section_active(
        &self,
        id: DbId,
        active: bool,
        actor: &Actor,
    ) -> Result<bool, BackendError> {
        Ok(PageSectionRepo::set_active(&self.pool, id, active, actor.origin).await?)
    }

    async fn latest_version_number(&self, path: &PagePath) -> Result<i32, BackendError> {
        Ok(ContentVersionRepo::get_latest_version_number(&self.pool, path).await?)
    }

    async fn insert_version(
        &self,
        input: &CreateContentVersion,
    ) -> Result<ContentVersion, BackendError> {
        Ok(ContentVersionRepo::create(&self.pool, input).await?)
    }

    async fn list_versions(&self, path: &PagePath) -> Result<Vec<ContentVersion>, BackendError> {
        Ok(ContentVersionRepo::list_by_page(&self.pool, path).await?)
    }

    async fn record_activity(
        &self,
        entry: &CreateActivityLog,
    ) -> Result<ActivityLog, BackendError> {
        Ok(ActivityLogRepo::create(&self.pool, entry).await?)
    }

    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityLog>, BackendError> {
        Ok(ActivityLogRepo::list_recent(&self.pool, limit).await?)
    }
}
