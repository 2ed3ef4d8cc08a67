//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use pagewright_api::auth::jwt::{generate_access_token, JwtConfig, ROLE_ADMIN};
use pagewright_api::config::ServerConfig;
use pagewright_api::editor::EditorSessions;
use pagewright_api::router::build_app_router;
use pagewright_api::state::AppState;
use async_trait::async_trait;
use pagewright_content::{
    Actor, BackendError, ContentConfig, ContentStore, InMemoryStore, PgContentStore, SeoCache,
};
use pagewright_core::forms::ContactFormConfig;
use pagewright_core::page_path::PagePath;
use pagewright_core::section::SectionType;
use pagewright_core::types::DbId;
use pagewright_core::seo::SeoDefaults;
use pagewright_db::models::activity_log::{ActivityLog, CreateActivityLog};
use pagewright_db::models::content_version::{ContentVersion, CreateContentVersion};
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use pagewright_events::{ChangeBus, Subscription};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::oneshot;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const SITE_URL: &str = "https://www.example.com";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        site_url: SITE_URL.to_string(),
        session_idle_timeout: Duration::from_secs(1800),
        content: ContentConfig::default(),
        contact_form: ContactFormConfig::default(),
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

/// A pool that never connects successfully, for apps backed by the
/// in-memory store.
pub fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy("postgres://pagewright@127.0.0.1:1/unused")
        .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub bus: Arc<ChangeBus>,
    pub sessions: Arc<EditorSessions>,
    _seo_watch: Subscription,
}

fn assemble(
    pool: PgPool,
    store: Arc<dyn ContentStore>,
    bus: Arc<ChangeBus>,
) -> (Router, Arc<EditorSessions>, Subscription) {
    let config = test_config();
    let seo_cache = Arc::new(SeoCache::new(
        Arc::clone(&store),
        SeoDefaults::new(SITE_URL),
        config.content.seo_ttl,
    ));
    let seo_watch = seo_cache.watch(bus.as_ref()).unwrap();
    let sessions = Arc::new(EditorSessions::new());

    let state = AppState {
        pool,
        store,
        config: Arc::new(config.clone()),
        change_bus: bus,
        seo_cache,
        sessions: Arc::clone(&sessions),
    };
    (build_app_router(state, &config), sessions, seo_watch)
}

/// Full router over an in-memory store that publishes its writes on the
/// app's change bus.
pub fn build_test_app() -> TestApp {
    let bus = Arc::new(ChangeBus::default());
    let store = Arc::new(InMemoryStore::with_feed(bus.clone()));
    let (router, sessions, seo_watch) = assemble(unreachable_pool(), store.clone(), bus.clone());
    TestApp {
        router,
        store,
        bus,
        sessions,
        _seo_watch: seo_watch,
    }
}

/// Full router over an in-memory store whose page upserts can be held
/// back. Returns the app (its `store` is the underlying in-memory store) and
/// the gated wrapper.
pub fn build_gated_app() -> (TestApp, Arc<UpsertGatedStore>) {
    let bus = Arc::new(ChangeBus::default());
    let store = Arc::new(InMemoryStore::with_feed(bus.clone()));
    let gated = Arc::new(UpsertGatedStore::new(store.clone()));
    let (router, sessions, seo_watch) = assemble(unreachable_pool(), gated.clone(), bus.clone());
    let app = TestApp {
        router,
        store,
        bus,
        sessions,
        _seo_watch: seo_watch,
    };
    (app, gated)
}

/// Full router over PostgreSQL.
pub fn build_pg_app(pool: PgPool) -> (Router, Subscription) {
    let bus = Arc::new(ChangeBus::default());
    let store = Arc::new(PgContentStore::new(pool.clone()));
    let (router, _sessions, seo_watch) = assemble(pool, store, bus);
    (router, seo_watch)
}

pub fn admin_token(user_id: i64) -> String {
    token_with_role(user_id, ROLE_ADMIN)
}

pub fn token_with_role(user_id: i64, role: &str) -> String {
    let config = JwtConfig {
        secret: TEST_SECRET.to_string(),
    };
    generate_access_token(user_id, role, 900, &config).unwrap()
}

pub fn path(p: &str) -> PagePath {
    PagePath::parse(p).unwrap()
}

/// Create `p` with a title and one text section per key.
pub async fn seed_page(store: &dyn ContentStore, p: &str, title: &str, keys: &[&str]) {
    let actor = Actor::default();
    store
        .upsert_page(
            &path(p),
            &UpdatePage {
                title: Some(title.to_string()),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    for (i, key) in keys.iter().enumerate() {
        store
            .insert_section(
                &CreatePageSection {
                    page_path: path(p),
                    section_key: key.to_string(),
                    title: None,
                    content: Some(format!("{key} body")),
                    section_type: SectionType::Text,
                    display_order: Some(i as i32 * 10),
                    metadata: None,
                },
                &actor,
            )
            .await
            .unwrap();
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::PATCH, uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::DELETE, uri, token, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
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

// ---------------------------------------------------------------------------
// UpsertGatedStore
// ---------------------------------------------------------------------------

/// Delegates to an [`InMemoryStore`]. A held page upsert is applied at once
/// but does not return until its gate is released.
pub struct UpsertGatedStore {
    pub inner: Arc<InMemoryStore>,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl UpsertGatedStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            gates: Mutex::default(),
        }
    }

    /// Hold the response of the next page upsert.
    pub fn hold_upsert(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl ContentStore for UpsertGatedStore {
    async fn find_page(&self, path: &PagePath) -> Result<Option<PageRecord>, BackendError> {
        self.inner.find_page(path).await
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
        let result = self.inner.upsert_page(path, input, actor).await;
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
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
        self.inner.update_section(id, input, actor).await
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
        self.inner.latest_version_number(path).await
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
