//! Shared helpers for content integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pagewright_content::{
    Actor, BackendError, ContentConfig, ContentManager, ContentStore, InMemoryStore, StoreOp,
};
use pagewright_core::page_path::PagePath;
use pagewright_core::section::SectionType;
use pagewright_core::types::DbId;
use pagewright_db::models::activity_log::{ActivityLog, CreateActivityLog};
use pagewright_db::models::content_version::{ContentVersion, CreateContentVersion};
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use pagewright_events::ChangeBus;
use tokio::sync::oneshot;

pub fn path(p: &str) -> PagePath {
    PagePath::parse(p).unwrap()
}

pub fn titled(title: &str) -> UpdatePage {
    UpdatePage {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

/// Actor standing in for another admin editing concurrently.
pub fn other_actor() -> Actor {
    Actor::user(99)
}

pub fn section_input(p: &str, key: &str, order: Option<i32>) -> CreatePageSection {
    CreatePageSection {
        page_path: path(p),
        section_key: key.to_string(),
        title: Some(format!("{key} title")),
        content: Some(format!("{key} body")),
        section_type: SectionType::Text,
        display_order: order,
        metadata: None,
    }
}

/// Create `p` with a title and the given section keys.
pub async fn seed_page(store: &dyn ContentStore, p: &str, title: &str, keys: &[&str]) {
    store
        .upsert_page(&path(p), &titled(title), &Actor::default())
        .await
        .unwrap();
    for (i, key) in keys.iter().enumerate() {
        store
            .insert_section(&section_input(p, key, Some(i as i32 * 10)), &Actor::default())
            .await
            .unwrap();
    }
}

pub fn manager_for(store: Arc<dyn ContentStore>, bus: Arc<ChangeBus>) -> Arc<ContentManager> {
    Arc::new(ContentManager::new(
        store,
        bus,
        Some(1),
        &ContentConfig::default(),
    ))
}

/// Poll `cond` until it holds, failing the test after two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn unavailable() -> BackendError {
    BackendError::Unavailable("connection refused".into())
}

// ---------------------------------------------------------------------------
// GatedStore
// ---------------------------------------------------------------------------

/// Wraps an [`InMemoryStore`] and can hold back chosen calls.
///
/// [`hold`](Self::hold) delays the response: the write reaches the store
/// immediately, but the call does not return until its gate is released.
/// [`hold_request`](Self::hold_request) delays the request itself, so the
/// write reaches the store only after release.
pub struct GatedStore {
    pub inner: InMemoryStore,
    gates: Mutex<HashMap<StoreOp, VecDeque<oneshot::Receiver<()>>>>,
    request_gates: Mutex<HashMap<StoreOp, VecDeque<oneshot::Receiver<()>>>>,
    parked: Mutex<HashMap<StoreOp, usize>>,
}

impl GatedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            gates: Mutex::default(),
            request_gates: Mutex::default(),
            parked: Mutex::default(),
        }
    }

    /// Hold the request of the next un-gated call to `op`.
    pub fn hold_request(&self, op: StoreOp) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.request_gates
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    /// How many requests for `op` have been parked by `hold_request`.
    pub fn parked(&self, op: StoreOp) -> usize {
        self.parked.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    async fn admit(&self, op: StoreOp) {
        let gate = self
            .request_gates
            .lock()
            .unwrap()
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            *self.parked.lock().unwrap().entry(op).or_default() += 1;
            let _ = gate.await;
        }
    }

    /// Hold the response of the next un-gated call to `op`.
    pub fn hold(&self, op: StoreOp) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    async fn pass(&self, op: StoreOp) {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl ContentStore for GatedStore {
    async fn find_page(&self, path: &PagePath) -> Result<Option<PageRecord>, BackendError> {
        let result = self.inner.find_page(path).await;
        self.pass(StoreOp::FindPage).await;
        result
    }

    async fn list_pages(&self) -> Result<Vec<PageRecord>, BackendError> {
        self.inner.list_pages().await
    }

    async fn list_sections(
        &self,
        path: &PagePath,
        include_inactive: bool,
    ) -> Result<Vec<PageSection>, BackendError> {
        self.inner.list_sections(path, include_inactive).await
    }

    async fn list_active_sections(&self) -> Result<Vec<PageSection>, BackendError> {
        self.inner.list_active_sections().await
    }

    async fn find_section(&self, id: DbId) -> Result<Option<PageSection>, BackendError> {
        self.inner.find_section(id).await
    }

    async fn upsert_page(
        &self,
        path: &PagePath,
        input: &UpdatePage,
        actor: &Actor,
    ) -> Result<PageRecord, BackendError> {
        self.admit(StoreOp::UpsertPage).await;
        let result = self.inner.upsert_page(path, input, actor).await;
        self.pass(StoreOp::UpsertPage).await;
        result
    }

    async fn insert_section(
        &self,
        input: &CreatePageSection,
        actor: &Actor,
    ) -> Result<PageSection, BackendError> {
        self.inner.insert_section(input, actor).await
    }

    async fn update_section(
        &self,
        id: DbId,
        input: &UpdatePageSection,
        actor: &Actor,
    ) -> Result<Option<PageSection>, BackendError> {
        let result = self.inner.update_section(id, input, actor).await;
        self.pass(StoreOp::UpdateSection).await;
        result
    }

    async fn set_section_active(
        &self,
        id: DbId,
        active: bool,
        actor: &Actor,
    ) -> Result<bool, BackendError> {
        self.inner.set_section_active(id, active, actor).await
    }

    async fn latest_version_number(&self, path: &PagePath) -> Result<i32, BackendError> {
        let result = self.inner.latest_version_number(path).await;
        self.pass(StoreOp::LatestVersionNumber).await;
        result
    }

    async fn insert_version(
        &self,
        input: &CreateContentVersion,
    ) -> Result<ContentVersion, BackendError> {
        self.inner.insert_version(input).await
    }

    async fn list_versions(&self, path: &PagePath) -> Result<Vec<ContentVersion>, BackendError> {
        self.inner.list_versions(path).await
    }

    async fn record_activity(
        &self,
        entry: &CreateActivityLog,
    ) -> Result<ActivityLog, BackendError> {
        self.inner.record_activity(entry).await
    }

    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityLog>, BackendError> {
        self.inner.list_activity(limit).await
    }
}
