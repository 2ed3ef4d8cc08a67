//! In-memory [`ContentStore`].
//!
//! Enforces the same constraints as the Postgres schema (unique section
//! keys, unique active display orders, unique version numbers, page
//! foreign keys) and can publish change events the way the database
//! triggers do. [`InMemoryStore::fail_next`] injects a backend failure into
//! the next call of a given operation.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use pagewright_core::page_path::PagePath;
use pagewright_core::section::next_display_order;
use pagewright_core::types::DbId;
use pagewright_db::models::activity_log::{ActivityLog, CreateActivityLog};
use pagewright_db::models::content_version::{ContentVersion, CreateContentVersion};
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use pagewright_events::{ChangeAction, ChangeEvent, ChangeFeed, Resource};

use super::{Actor, ContentStore};
use crate::error::BackendError;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindPage,
    ListPages,
    ListSections,
    ListActiveSections,
    FindSection,
    UpsertPage,
    InsertSection,
    UpdateSection,
    SetSectionActive,
    LatestVersionNumber,
    InsertVersion,
    ListVersions,
    RecordActivity,
    ListActivity,
}

#[derive(Default)]
struct State {
    pages: BTreeMap<PagePath, PageRecord>,
    sections: Vec<PageSection>,
    versions: Vec<ContentVersion>,
    activity: Vec<ActivityLog>,
    next_id: DbId,
    failures: HashMap<StoreOp, VecDeque<BackendError>>,
    calls: HashMap<StoreOp, usize>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    /// Count the call and pop an injected failure, if any.
    fn enter(&mut self, op: StoreOp) -> Result<(), BackendError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn require_page(&self, path: &PagePath) -> Result<(), BackendError> {
        if self.pages.contains_key(path) {
            Ok(())
        } else {
            Err(BackendError::Query(format!(
                "insert violates foreign key: page '{path}' does not exist"
            )))
        }
    }

    fn order_taken(&self, path: &PagePath, order: i32, except: Option<DbId>) -> bool {
        self.sections.iter().any(|s| {
            s.is_active && &s.page_path == path && s.display_order == order && Some(s.id) != except
        })
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    feed: Option<Arc<dyn ChangeFeed>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a change event on `feed` for every page or section write.
    pub fn with_feed(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            state: Mutex::default(),
            feed: Some(feed),
        }
    }

    /// Make the next call of `op` fail with `err`. Failures queue up.
    pub fn fail_next(&self, op: StoreOp, err: BackendError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// How many times `op` has been called.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, resource: Resource, action: ChangeAction, path: &PagePath, actor: &Actor) {
        if let Some(feed) = &self.feed {
            let event = ChangeEvent::new(resource, action, path.clone());
            feed.publish(match actor.origin {
                Some(origin) => event.with_origin(origin),
                None => event,
            });
        }
    }
}

/// COALESCE-style application of an update onto a record.
fn apply_update(record: &mut PageRecord, input: &UpdatePage) {
    fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
        if let Some(v) = value {
            *slot = v.clone();
        }
    }
    fn set_opt<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
        if value.is_some() {
            *slot = value.clone();
        }
    }

    let seo = &input.seo;
    set(&mut record.title, &input.title);
    set(&mut record.is_published, &input.is_published);
    set_opt(&mut record.meta_title, &seo.meta_title);
    set_opt(&mut record.meta_description, &seo.meta_description);
    set_opt(&mut record.keywords, &seo.keywords);
    set_opt(&mut record.canonical_url, &seo.canonical_url);
    set_opt(&mut record.og_title, &seo.og_title);
    set_opt(&mut record.og_description, &seo.og_description);
    set_opt(&mut record.og_image, &seo.og_image);
    set_opt(&mut record.twitter_card, &seo.twitter_card);
    set_opt(&mut record.twitter_title, &seo.twitter_title);
    set_opt(&mut record.twitter_description, &seo.twitter_description);
    set_opt(&mut record.twitter_image, &seo.twitter_image);
    set_opt(&mut record.robots, &seo.robots);
}

fn sorted_sections<'a>(sections: impl Iterator<Item = &'a PageSection>) -> Vec<PageSection> {
    let mut out: Vec<PageSection> = sections.cloned().collect();
    out.sort_by(|a, b| {
        (&a.page_path, a.display_order, a.id).cmp(&(&b.page_path, b.display_order, b.id))
    });
    out
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn find_page(&self, path: &PagePath) -> Result<Option<PageRecord>, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::FindPage)?;
        Ok(state.pages.get(path).cloned())
    }

    async fn list_pages(&self) -> Result<Vec<PageRecord>, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::ListPages)?;
        Ok(state.pages.values().cloned().collect())
    }

    async fn list_sections(
        &self,
        path: &PagePath,
        include_inactive: bool,
    ) -> Result<Vec<PageSection>, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::ListSections)?;
        Ok(sorted_sections(
            state
                .sections
                .iter()
                .filter(|s| &s.page_path == path && (include_inactive || s.is_active)),
        ))
    }

    async fn list_active_sections(&self) -> Result<Vec<PageSection>, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::ListActiveSections)?;
        Ok(sorted_sections(state.sections.iter().filter(|s| s.is_active)))
    }

    async fn find_section(&self, id: DbId) -> Result<Option<PageSection>, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::FindSection)?;
        Ok(state.sections.iter().find(|s| s.id == id).cloned())
    }

    async fn upsert_page(
        &self,
        path: &PagePath,
        input: &UpdatePage,
        actor: &Actor,
    ) -> Result<PageRecord, BackendError> {
        let (record, action) = {
            let mut state = self.lock();
            state.enter(StoreOp::UpsertPage)?;
            let now = Utc::now();
            let action = if state.pages.contains_key(path) {
                ChangeAction::Update
            } else {
                ChangeAction::Insert
            };
            let record = state.pages.entry(path.clone()).or_insert_with(|| PageRecord {
                page_path: path.clone(),
                title: String::new(),
                meta_title: None,
                meta_description: None,
                keywords: None,
                canonical_url: None,
                og_title: None,
                og_description: None,
                og_image: None,
                twitter_card: None,
                twitter_title: None,
                twitter_description: None,
                twitter_image: None,
                robots: None,
                is_published: false,
                created_at: now,
                updated_at: now,
                updated_by: None,
            });
            apply_update(record, input);
            record.updated_at = now;
            record.updated_by = actor.user_id;
            (record.clone(), action)
        };
        self.notify(Resource::Pages, action, path, actor);
        Ok(record)
    }

    async fn insert_section(
        &self,
        input: &CreatePageSection,
        actor: &Actor,
    ) -> Result<PageSection, BackendError> {
        let section = {
            let mut state = self.lock();
            state.enter(StoreOp::InsertSection)?;
            state.require_page(&input.page_path)?;

            let path = &input.page_path;
            if state
                .sections
                .iter()
                .any(|s| &s.page_path == path && s.section_key == input.section_key)
            {
                return Err(BackendError::Conflict("uq_page_sections_key".into()));
            }
            let display_order = input.display_order.unwrap_or_else(|| {
                next_display_order(
                    state
                        .sections
                        .iter()
                        .filter(|s| s.is_active && &s.page_path == path)
                        .map(|s| s.display_order),
                )
            });
            if state.order_taken(path, display_order, None) {
                return Err(BackendError::Conflict("uq_page_sections_active_order".into()));
            }

            let now = Utc::now();
            let section = PageSection {
                id: state.next_id(),
                page_path: path.clone(),
                section_key: input.section_key.clone(),
                title: input.title.clone(),
                content: input.content.clone().unwrap_or_default(),
                section_type: input.section_type,
                display_order,
                is_active: true,
                metadata: input
                    .metadata
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({})),
                created_at: now,
                updated_at: now,
            };
            state.sections.push(section.clone());
            section
        };
        self.notify(Resource::PageSections, ChangeAction::Insert, &section.page_path, actor);
        Ok(section)
    }

    async fn update_section(
        &self,
        id: DbId,
        input: &UpdatePageSection,
        actor: &Actor,
    ) -> Result<Option<PageSection>, BackendError> {
        let updated = {
            let mut state = self.lock();
            state.enter(StoreOp::UpdateSection)?;
            let Some(index) = state.sections.iter().position(|s| s.id == id) else {
                return Ok(None);
            };

            let mut section = state.sections[index].clone();
            input.apply_to(&mut section);
            if section.is_active && state.order_taken(&section.page_path, section.display_order, Some(id)) {
                return Err(BackendError::Conflict("uq_page_sections_active_order".into()));
            }
            section.updated_at = Utc::now();
            state.sections[index] = section.clone();
            section
        };
        self.notify(Resource::PageSections, ChangeAction::Update, &updated.page_path, actor);
        Ok(Some(updated))
    }

    async fn set_section_active(
        &self,
        id: DbId,
        active: bool,
        actor: &Actor,
    ) -> Result<bool, BackendError> {
        let page_path = {
            let mut state = self.lock();
            state.enter(StoreOp::SetSectionActive)?;
            let Some(index) = state
                .sections
                .iter()
                .position(|s| s.id == id && s.is_active != active)
            else {
                return Ok(false);
            };
            let (path, order) = {
                let s = &state.sections[index];
                (s.page_path.clone(), s.display_order)
            };
            if active && state.order_taken(&path, order, Some(id)) {
                return Err(BackendError::Conflict("uq_page_sections_active_order".into()));
            }
            let section = &mut state.sections[index];
            section.is_active = active;
            section.updated_at = Utc::now();
            path
        };
        self.notify(Resource::PageSections, ChangeAction::Update, &page_path, actor);
        Ok(true)
    }

    async fn latest_version_number(&self, path: &PagePath) -> Result<i32, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::LatestVersionNumber)?;
        Ok(state
            .versions
            .iter()
            .filter(|v| &v.page_path == path)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0))
    }

    async fn insert_version(
        &self,
        input: &CreateContentVersion,
    ) -> Result<ContentVersion, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::InsertVersion)?;
        state.require_page(&input.page_path)?;
        if input.version_number <= 0 {
            return Err(BackendError::Query("version_number must be positive".into()));
        }
        if state
            .versions
            .iter()
            .any(|v| v.page_path == input.page_path && v.version_number == input.version_number)
        {
            return Err(BackendError::Conflict("uq_content_versions_number".into()));
        }

        let version = ContentVersion {
            id: state.next_id(),
            page_path: input.page_path.clone(),
            content_data: input.content_data.clone(),
            version_number: input.version_number,
            change_description: input.change_description.clone(),
            created_by: input.created_by,
            created_at: Utc::now(),
        };
        state.versions.push(version.clone());
        Ok(version)
    }

    async fn list_versions(&self, path: &PagePath) -> Result<Vec<ContentVersion>, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::ListVersions)?;
        let mut versions: Vec<ContentVersion> = state
            .versions
            .iter()
            .filter(|v| &v.page_path == path)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn record_activity(
        &self,
        entry: &CreateActivityLog,
    ) -> Result<ActivityLog, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::RecordActivity)?;
        let log = ActivityLog {
            id: state.next_id(),
            admin_user_id: entry.admin_user_id,
            action: entry.action.clone(),
            entity_type: entry.entity_type.clone(),
            entity_key: entry.entity_key.clone(),
            details: entry.details.clone(),
            created_at: Utc::now(),
        };
        state.activity.push(log.clone());
        Ok(log)
    }

    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityLog>, BackendError> {
        let mut state = self.lock();
        state.enter(StoreOp::ListActivity)?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state.activity.iter().rev().take(limit).cloned().collect())
    }
}
