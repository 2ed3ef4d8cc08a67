//! The content manager: owner of the working copy for the page open in an
//! editor.
//!
//! State machine: `Idle` → `Loading` → `Clean` ⇄ `Dirty`, and back to
//! `Loading` on navigation. Every mutation is applied optimistically as a
//! [`command`](crate::command) object, sent to the store, then either
//! reconciled with the server copy or reverted.
//!
//! Concurrency rules:
//!
//! - The state mutex is never held across a store call.
//! - Each load is tagged with a sequence number; only the most recently
//!   requested load may install its result.
//! - Each completed load (and each undo) starts a new epoch; acknowledgements
//!   of mutations issued in an earlier epoch are discarded.
//! - Each mutation records itself as the latest writer of the fields (or
//!   section) it touches. An acknowledgement only adopts the server value of
//!   fields it still owns or that no mutation touched; fields owned by any
//!   other writer, older or newer, keep their working value. A failure only
//!   reverts fields it still owns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use pagewright_core::page_path::PagePath;
use pagewright_core::section::{next_display_order, validate_section_key, SectionType};
use pagewright_core::seo::validate_seo;
use pagewright_core::types::DbId;
use pagewright_core::validation::ValidationError;
use pagewright_db::models::activity_log::CreateActivityLog;
use pagewright_db::models::content_version::ContentVersion;
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use pagewright_events::{ChangeAction, ChangeEvent, ChangeFeed, Resource};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::command::{insert_sorted, MetadataCommand, PageField, SectionCommand};
use crate::config::ContentConfig;
use crate::error::ContentError;
use crate::notice::Notice;
use crate::resource::{self, PageContent};
use crate::store::{Actor, ContentStore};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    /// Nothing loaded.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Working copy equals the original.
    Clean,
    /// Working copy differs from the original.
    Dirty,
}

/// Input for [`ContentManager::add_section`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSection {
    pub section_key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub section_type: SectionType,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Point-in-time view of the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSnapshot {
    pub page_path: Option<PagePath>,
    pub state: EditorState,
    pub working: Option<PageContent>,
    /// Fields where the working copy differs from the original, e.g.
    /// `meta_title` or `sections.hero`.
    pub changed_fields: Vec<String>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Identifies one in-flight mutation.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    seq: u64,
    epoch: u64,
}

#[derive(Default)]
struct Inner {
    active_path: Option<PagePath>,
    load_seq: u64,
    loading: bool,
    epoch: u64,
    working: Option<PageContent>,
    original: Option<PageContent>,
    next_write: u64,
    field_writers: HashMap<PageField, u64>,
    section_writers: HashMap<DbId, u64>,
    next_provisional: DbId,
}

impl Inner {
    fn state(&self) -> EditorState {
        if self.loading {
            return EditorState::Loading;
        }
        match (&self.working, &self.original) {
            (None, _) => EditorState::Idle,
            (Some(w), Some(o)) if w == o => EditorState::Clean,
            _ => EditorState::Dirty,
        }
    }

    /// Replace both copies and start a new epoch.
    fn install(&mut self, content: Option<PageContent>) {
        self.working = content.clone();
        self.original = content;
        self.new_epoch();
    }

    fn new_epoch(&mut self) {
        self.epoch += 1;
        self.field_writers.clear();
        self.section_writers.clear();
    }

    fn working_mut(&mut self, path: &PagePath) -> Result<&mut PageContent, ContentError> {
        match self.working.as_mut() {
            Some(working) if working.path() == path => Ok(working),
            _ => Err(ContentError::NotLoaded { path: path.clone() }),
        }
    }

    fn begin_write(&mut self) -> Ticket {
        self.next_write += 1;
        Ticket {
            seq: self.next_write,
            epoch: self.epoch,
        }
    }

    fn next_provisional_id(&mut self) -> DbId {
        self.next_provisional -= 1;
        self.next_provisional
    }

    fn is_current(&self, path: &PagePath, epoch: u64) -> bool {
        self.epoch == epoch && self.active_path.as_ref() == Some(path)
    }

    /// Adopt the server copy, keeping fields last written by another
    /// mutation. The request of an older mutation may reach the backend after
    /// this one, so its fields in `server` can predate it.
    fn reconcile_page(&mut self, server: PageRecord, seq: u64) {
        let Inner {
            working,
            field_writers,
            ..
        } = self;
        let Some(working) = working.as_mut() else {
            return;
        };
        let mut merged = server;
        for (field, writer) in field_writers.iter() {
            if *writer != seq {
                field.write(&mut merged, &field.read(&working.page));
            }
        }
        working.page = merged;
    }

    fn revert_page(&mut self, command: &MetadataCommand, seq: u64) {
        let Inner {
            working,
            field_writers,
            ..
        } = self;
        if let Some(working) = working.as_mut() {
            command.revert_where(&mut working.page, |f| field_writers.get(&f) == Some(&seq));
        }
    }

    /// Replace the section `local_id` with the server copy unless a newer
    /// write to it is pending.
    fn reconcile_section(&mut self, local_id: DbId, server: PageSection, seq: u64) {
        if self.section_writers.get(&local_id).is_some_and(|w| *w > seq) {
            return;
        }
        let Some(working) = self.working.as_mut() else {
            return;
        };
        working.sections.retain(|s| s.id != local_id && s.id != server.id);
        if server.is_active {
            insert_sorted(&mut working.sections, server);
        }
    }

    fn revert_section(&mut self, command: &SectionCommand, seq: u64) {
        if self.section_writers.get(&command.section_id()) != Some(&seq) {
            return;
        }
        if let Some(working) = self.working.as_mut() {
            command.revert(&mut working.sections);
        }
    }

    fn changed_fields(&self) -> Vec<String> {
        let (Some(working), Some(original)) = (&self.working, &self.original) else {
            return Vec::new();
        };

        let mut changed: Vec<String> = PageField::all()
            .filter(|f| f.read(&working.page) != f.read(&original.page))
            .map(|f| f.as_str().to_string())
            .collect();

        for section in &working.sections {
            if original.sections.iter().all(|o| o != section) {
                changed.push(format!("sections.{}", section.section_key));
            }
        }
        for section in &original.sections {
            if working.sections.iter().all(|w| w.id != section.id) {
                changed.push(format!("sections.{}", section.section_key));
            }
        }
        changed.dedup();
        changed
    }
}

// ---------------------------------------------------------------------------
// ContentManager
// ---------------------------------------------------------------------------

/// Stateful coordinator for one editor view.
///
/// Construct one per editor and share it via `Arc`. The manager's
/// [`id`](Self::id) tags every write it makes so its own change
/// notifications can be told apart from other actors'.
pub struct ContentManager {
    id: Uuid,
    store: Arc<dyn ContentStore>,
    feed: Arc<dyn ChangeFeed>,
    actor_id: Option<DbId>,
    inner: Mutex<Inner>,
    notices: broadcast::Sender<Notice>,
}

impl ContentManager {
    pub fn new(
        store: Arc<dyn ContentStore>,
        feed: Arc<dyn ChangeFeed>,
        actor_id: Option<DbId>,
        config: &ContentConfig,
    ) -> Self {
        let (notices, _) = broadcast::channel(config.notice_buffer.max(1));
        Self {
            id: Uuid::new_v4(),
            store,
            feed,
            actor_id,
            inner: Mutex::default(),
            notices,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive user-visible notices from now on.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn active_path(&self) -> Option<PagePath> {
        self.lock().active_path.clone()
    }

    pub fn state(&self) -> EditorState {
        self.lock().state()
    }

    pub fn working_copy(&self) -> Option<PageContent> {
        self.lock().working.clone()
    }

    pub fn original(&self) -> Option<PageContent> {
        self.lock().original.clone()
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let inner = self.lock();
        EditorSnapshot {
            page_path: inner.active_path.clone(),
            state: inner.state(),
            working: inner.working.clone(),
            changed_fields: inner.changed_fields(),
        }
    }

    // -- Loading ------------------------------------------------------------

    /// Fetch `path` and install it as both working copy and original.
    ///
    /// A path with no stored record loads as blank content. If a newer load
    /// was requested while this one was in flight, the result is discarded
    /// and [`ContentError::Stale`] returned.
    pub async fn load_page(&self, path: &PagePath) -> Result<(), ContentError> {
        let seq = {
            let mut inner = self.lock();
            if inner.active_path.as_ref() != Some(path) {
                inner.active_path = Some(path.clone());
                inner.install(None);
            }
            inner.load_seq += 1;
            inner.loading = true;
            inner.load_seq
        };

        let result = resource::fetch_page(self.store.as_ref(), path).await;

        let mut inner = self.lock();
        if inner.load_seq != seq {
            tracing::debug!(page_path = %path, "Discarding superseded load");
            return Err(ContentError::Stale { path: path.clone() });
        }
        inner.loading = false;

        match result {
            Ok(content) => {
                let content = content.unwrap_or_else(|| PageContent::blank(path.clone()));
                inner.install(Some(content));
                tracing::debug!(page_path = %path, "Page loaded");
                Ok(())
            }
            Err(e) => {
                inner.install(None);
                drop(inner);
                Err(self.fail(path, "Failed to load page", e.into()))
            }
        }
    }

    // -- Page metadata --------------------------------------------------------

    /// Apply `fields` to the working copy of `path` and persist them.
    pub async fn update_metadata(
        &self,
        path: &PagePath,
        fields: UpdatePage,
    ) -> Result<(), ContentError> {
        if let Err(e) = validate_seo(&fields.seo) {
            return Err(self.fail(path, "Invalid page metadata", e.into()));
        }
        if fields.is_empty() {
            return Ok(());
        }

        let (ticket, command) = {
            let mut inner = self.lock();
            let command = {
                let working = inner.working_mut(path)?;
                let command = MetadataCommand::new(&working.page, &fields);
                command.apply(&mut working.page);
                command
            };
            let ticket = inner.begin_write();
            for field in command.fields() {
                inner.field_writers.insert(field, ticket.seq);
            }
            (ticket, command)
        };

        let result = resource::upsert_page(self.store.as_ref(), path, &fields, &self.actor()).await;

        {
            let mut inner = self.lock();
            if !inner.is_current(path, ticket.epoch) {
                tracing::debug!(page_path = %path, "Discarding stale metadata acknowledgement");
                return Err(ContentError::Stale { path: path.clone() });
            }
            match result {
                Ok(server) => inner.reconcile_page(server, ticket.seq),
                Err(e) => {
                    inner.revert_page(&command, ticket.seq);
                    drop(inner);
                    return Err(self.fail(path, "Failed to update page", e));
                }
            }
        }

        let names: Vec<&str> = command.fields().map(|f| f.as_str()).collect();
        self.record("page.update", path, json!({ "fields": names })).await;
        Ok(())
    }

    // -- Sections -------------------------------------------------------------

    /// Update one section of the working copy and persist it.
    pub async fn update_section(
        &self,
        path: &PagePath,
        id: DbId,
        input: UpdatePageSection,
    ) -> Result<(), ContentError> {
        let (ticket, command) = {
            let mut inner = self.lock();
            let command = {
                let working = inner.working_mut(path)?;
                let before = working
                    .sections
                    .iter()
                    .find(|s| s.id == id)
                    .cloned()
                    .ok_or(ContentError::SectionNotFound(id))?;
                let mut after = before.clone();
                input.apply_to(&mut after);
                let command = SectionCommand::Update { before, after };
                command.apply(&mut working.sections);
                working.sort_sections();
                command
            };
            let ticket = inner.begin_write();
            inner.section_writers.insert(id, ticket.seq);
            (ticket, command)
        };

        let result = resource::upsert_section(self.store.as_ref(), id, &input, &self.actor()).await;

        {
            let mut inner = self.lock();
            if !inner.is_current(path, ticket.epoch) {
                tracing::debug!(page_path = %path, section_id = id, "Discarding stale section acknowledgement");
                return Err(ContentError::Stale { path: path.clone() });
            }
            match result {
                Ok(server) => inner.reconcile_section(id, server, ticket.seq),
                Err(e) => {
                    inner.revert_section(&command, ticket.seq);
                    drop(inner);
                    return Err(self.fail(path, "Failed to update section", e));
                }
            }
        }

        self.record("section.update", path, json!({ "section_id": id })).await;
        Ok(())
    }

    /// Add a section to the working copy and persist it. Returns the stored
    /// section with its real id.
    pub async fn add_section(
        &self,
        path: &PagePath,
        new: NewSection,
    ) -> Result<PageSection, ContentError> {
        if let Err(e) = validate_section_key(&new.section_key) {
            let err = ValidationError::single("section_key", "regex_pattern", e.to_string());
            return Err(self.fail(path, "Invalid section", err.into()));
        }

        let (ticket, command) = {
            let mut inner = self.lock();
            let provisional_id = inner.next_provisional_id();
            let command = {
                let working = inner.working_mut(path)?;
                let display_order = new.display_order.unwrap_or_else(|| {
                    next_display_order(working.sections.iter().map(|s| s.display_order))
                });
                let now = Utc::now();
                let command = SectionCommand::Add {
                    provisional: PageSection {
                        id: provisional_id,
                        page_path: path.clone(),
                        section_key: new.section_key.clone(),
                        title: new.title.clone(),
                        content: new.content.clone().unwrap_or_default(),
                        section_type: new.section_type,
                        display_order,
                        is_active: true,
                        metadata: new.metadata.clone().unwrap_or_else(|| json!({})),
                        created_at: now,
                        updated_at: now,
                    },
                };
                command.apply(&mut working.sections);
                command
            };
            let ticket = inner.begin_write();
            inner.section_writers.insert(provisional_id, ticket.seq);
            (ticket, command)
        };

        let create = CreatePageSection {
            page_path: path.clone(),
            section_key: new.section_key,
            title: new.title,
            content: new.content,
            section_type: new.section_type,
            display_order: new.display_order,
            metadata: new.metadata,
        };
        let result = resource::add_section(self.store.as_ref(), &create, &self.actor()).await;

        let section = {
            let mut inner = self.lock();
            if !inner.is_current(path, ticket.epoch) {
                tracing::debug!(page_path = %path, "Discarding stale section acknowledgement");
                return Err(ContentError::Stale { path: path.clone() });
            }
            match result {
                Ok(server) => {
                    inner.reconcile_section(command.section_id(), server.clone(), ticket.seq);
                    server
                }
                Err(e) => {
                    inner.revert_section(&command, ticket.seq);
                    drop(inner);
                    return Err(self.fail(path, "Failed to add section", e));
                }
            }
        };

        self.record(
            "section.add",
            path,
            json!({ "section_id": section.id, "section_key": section.section_key }),
        )
        .await;
        Ok(section)
    }

    /// Soft-delete a section: it leaves the working copy immediately and is
    /// deactivated in the store.
    pub async fn remove_section(&self, path: &PagePath, id: DbId) -> Result<(), ContentError> {
        let (ticket, command) = {
            let mut inner = self.lock();
            let command = {
                let working = inner.working_mut(path)?;
                let before = working
                    .sections
                    .iter()
                    .find(|s| s.id == id)
                    .cloned()
                    .ok_or(ContentError::SectionNotFound(id))?;
                let command = SectionCommand::Remove { before };
                command.apply(&mut working.sections);
                command
            };
            let ticket = inner.begin_write();
            inner.section_writers.insert(id, ticket.seq);
            (ticket, command)
        };

        let result = resource::deactivate_section(self.store.as_ref(), id, &self.actor()).await;

        {
            let mut inner = self.lock();
            if !inner.is_current(path, ticket.epoch) {
                tracing::debug!(page_path = %path, section_id = id, "Discarding stale section acknowledgement");
                return Err(ContentError::Stale { path: path.clone() });
            }
            if let Err(e) = result {
                inner.revert_section(&command, ticket.seq);
                drop(inner);
                return Err(self.fail(path, "Failed to remove section", e));
            }
        }

        self.record("section.deactivate", path, json!({ "section_id": id })).await;
        Ok(())
    }

    // -- Versions -------------------------------------------------------------

    /// Snapshot the working copy of `path` as a new content version, make it
    /// the original, and announce the save to other views.
    pub async fn save_changes(
        &self,
        path: &PagePath,
        description: Option<String>,
    ) -> Result<ContentVersion, ContentError> {
        let (content, epoch) = {
            let mut inner = self.lock();
            let content = inner.working_mut(path)?.clone();
            (content, inner.epoch)
        };
        let snapshot = serde_json::to_value(&content)?;

        let version = match resource::save_version(
            self.store.as_ref(),
            path,
            snapshot,
            description,
            &self.actor(),
        )
        .await
        {
            Ok(version) => version,
            Err(e) => return Err(self.fail(path, "Failed to save changes", e.into())),
        };

        {
            let mut inner = self.lock();
            if inner.is_current(path, epoch) {
                inner.original = Some(content);
            } else {
                tracing::debug!(page_path = %path, "Page reloaded during save, original kept");
            }
        }

        self.feed.publish(
            ChangeEvent::new(Resource::ContentVersions, ChangeAction::Insert, path.clone())
                .with_origin(self.id),
        );
        self.notify(Notice::info(
            Some(path.clone()),
            format!("Saved version {}", version.version_number),
        ));
        self.record(
            "version.save",
            path,
            json!({ "version_number": version.version_number }),
        )
        .await;
        Ok(version)
    }

    /// Discard the working copy in favour of a fresh copy of the original.
    /// Acknowledgements of in-flight mutations are discarded afterwards.
    pub fn undo_changes(&self) {
        let mut inner = self.lock();
        if inner.original.is_none() {
            return;
        }
        inner.working = inner.original.clone();
        inner.new_epoch();
    }

    // -- Helpers --------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn actor(&self) -> Actor {
        Actor {
            user_id: self.actor_id,
            origin: Some(self.id),
        }
    }

    fn notify(&self, notice: Notice) {
        // Ignore the SendError, it only means nobody is listening.
        let _ = self.notices.send(notice);
    }

    /// Log and surface a failure, returning it for propagation.
    fn fail(&self, path: &PagePath, action: &str, err: ContentError) -> ContentError {
        tracing::warn!(page_path = %path, error = %err, "{action}");
        self.notify(Notice::error(Some(path.clone()), format!("{action}: {err}")));
        err
    }

    async fn record(&self, action: &str, path: &PagePath, details: serde_json::Value) {
        let entry = CreateActivityLog::new(self.actor_id, action, "page", Some(path.to_string()))
            .with_details(details);
        resource::record_activity(self.store.as_ref(), entry).await;
    }
}
