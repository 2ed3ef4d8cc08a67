use std::sync::Arc;

use pagewright_content::{ContentStore, SeoCache};
use pagewright_events::ChangeBus;

use crate::config::ServerConfig;
use crate::editor::EditorSessions;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is an `Arc` or a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used directly for form submissions.
    pub pool: pagewright_db::DbPool,
    /// Backend for page, section, version and activity data.
    pub store: Arc<dyn ContentStore>,
    pub config: Arc<ServerConfig>,
    /// In-process change feed shared by editor bridges and the SEO cache.
    pub change_bus: Arc<ChangeBus>,
    pub seo_cache: Arc<SeoCache>,
    pub sessions: Arc<EditorSessions>,
}
