//! Editor sessions: one [`ContentManager`] and [`ChangeBridge`] per open
//! editor, owned by the admin who opened it.
//!
//! Sessions that see no request for the idle timeout are torn down by the
//! reaper started with [`start_reaper`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pagewright_content::{ChangeBridge, ContentConfig, ContentManager, ContentStore};
use pagewright_core::error::CoreError;
use pagewright_core::types::{DbId, Timestamp};
use pagewright_events::ChangeFeed;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// Interval between idle-session sweeps (in seconds).
const REAP_INTERVAL_SECS: u64 = 60;

pub struct EditorSession {
    pub id: Uuid,
    pub owner: DbId,
    pub bridge: ChangeBridge,
    pub opened_at: Timestamp,
    last_touched: Mutex<Instant>,
}

impl EditorSession {
    pub fn manager(&self) -> &Arc<ContentManager> {
        self.bridge.manager()
    }

    fn touch(&self) {
        *self.last_touched.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Time since the session was opened or last fetched.
    pub fn idle_for(&self) -> Duration {
        self.last_touched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Registry of open editor sessions.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` in [`AppState`](crate::state::AppState).
pub struct EditorSessions {
    sessions: RwLock<HashMap<Uuid, Arc<EditorSession>>>,
}

impl EditorSessions {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a session for `owner` with a fresh manager and bridge.
    pub async fn open(
        &self,
        owner: DbId,
        store: Arc<dyn ContentStore>,
        feed: Arc<dyn ChangeFeed>,
        config: &ContentConfig,
    ) -> Arc<EditorSession> {
        let manager = Arc::new(ContentManager::new(store, feed.clone(), Some(owner), config));
        let session = Arc::new(EditorSession {
            id: Uuid::new_v4(),
            owner,
            bridge: ChangeBridge::new(manager, feed),
            opened_at: chrono::Utc::now(),
            last_touched: Mutex::new(Instant::now()),
        });

        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        tracing::info!(session_id = %session.id, user_id = owner, "Editor session opened");
        session
    }

    /// The session `id`, if it exists and belongs to `owner`. Marks the
    /// session as in use.
    pub async fn get(&self, id: Uuid, owner: DbId) -> Result<Arc<EditorSession>, CoreError> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("EditorSession", id))?;

        if session.owner != owner {
            return Err(CoreError::Forbidden(
                "Editor session belongs to another user".into(),
            ));
        }
        session.touch();
        Ok(session)
    }

    /// Close a session and drop its change subscriptions.
    pub async fn close(&self, id: Uuid, owner: DbId) -> Result<(), CoreError> {
        let session = self.get(id, owner).await?;
        session.bridge.teardown();
        self.sessions.write().await.remove(&id);
        tracing::info!(session_id = %id, user_id = owner, "Editor session closed");
        Ok(())
    }

    /// Tear down and remove sessions idle for at least `max_idle`. Returns
    /// how many were closed.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            if session.idle_for() < max_idle {
                return true;
            }
            session.bridge.teardown();
            tracing::info!(session_id = %id, user_id = session.owner, "Idle editor session closed");
            false
        });
        before - sessions.len()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Tear down every session. Used during graceful shutdown.
    pub async fn close_all(&self) {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        for session in sessions.values() {
            session.bridge.teardown();
        }
        sessions.clear();
        tracing::info!(count, "Closed all editor sessions");
    }
}

impl Default for EditorSessions {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a background task that closes sessions idle for `idle_timeout`.
///
/// Runs until aborted through the returned handle.
pub fn start_reaper(
    sessions: Arc<EditorSessions>,
    idle_timeout: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(REAP_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let closed = sessions.reap_idle(idle_timeout).await;
            if closed > 0 {
                tracing::debug!(closed, "Editor session sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewright_content::InMemoryStore;
    use pagewright_events::ChangeBus;

    async fn open(sessions: &EditorSessions, owner: DbId) -> Arc<EditorSession> {
        sessions
            .open(
                owner,
                Arc::new(InMemoryStore::new()),
                Arc::new(ChangeBus::default()),
                &ContentConfig::default(),
            )
            .await
    }

    #[tokio::test]
    async fn sessions_are_owner_scoped() {
        let sessions = EditorSessions::new();
        let session = open(&sessions, 1).await;

        assert!(sessions.get(session.id, 1).await.is_ok());
        assert!(matches!(
            sessions.get(session.id, 2).await,
            Err(CoreError::Forbidden(_))
        ));
        assert!(matches!(
            sessions.get(Uuid::new_v4(), 1).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn close_removes_and_tears_down() {
        let sessions = EditorSessions::new();
        let session = open(&sessions, 1).await;
        session
            .bridge
            .navigate(&pagewright_core::page_path::PagePath::root())
            .await
            .unwrap();
        assert!(session.bridge.is_subscribed());

        sessions.close(session.id, 1).await.unwrap();
        assert_eq!(sessions.count().await, 0);
        assert!(!session.bridge.is_subscribed());
    }

    #[tokio::test]
    async fn close_all_empties_registry() {
        let sessions = EditorSessions::new();
        open(&sessions, 1).await;
        open(&sessions, 2).await;
        sessions.close_all().await;
        assert_eq!(sessions.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_reaped() {
        let sessions = EditorSessions::new();
        let idle = open(&sessions, 1).await;
        let busy = open(&sessions, 1).await;
        idle.bridge
            .navigate(&pagewright_core::page_path::PagePath::root())
            .await
            .unwrap();
        assert!(idle.bridge.is_subscribed());

        tokio::time::advance(Duration::from_secs(600)).await;
        sessions.get(busy.id, 1).await.unwrap();
        tokio::time::advance(Duration::from_secs(300)).await;

        assert_eq!(sessions.reap_idle(Duration::from_secs(900)).await, 1);
        assert!(!idle.bridge.is_subscribed());
        assert!(sessions.get(busy.id, 1).await.is_ok());
        assert!(matches!(
            sessions.get(idle.id, 1).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn reaper_task_closes_abandoned_sessions() {
        let sessions = Arc::new(EditorSessions::new());
        open(&sessions, 1).await;
        let reaper = start_reaper(Arc::clone(&sessions), Duration::from_secs(120));

        tokio::time::sleep(Duration::from_secs(REAP_INTERVAL_SECS * 4)).await;
        assert_eq!(sessions.count().await, 0);
        reaper.abort();
    }
}
