//! Keeps the edited page fresh while other actors change it.
//!
//! A [`ChangeBridge`] holds subscriptions for the manager's active path on
//! the `pages`, `page_sections` and `content_versions` feeds. An event for
//! the active path triggers a reload unless the manager itself caused it.
//! Delivery is best effort: bursts are not deduplicated, and reloads are
//! idempotent.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pagewright_core::page_path::PagePath;
use pagewright_events::{ChangeEvent, ChangeFeed, ChangeFilter, Resource, Subscription};

use crate::error::ContentError;
use crate::manager::ContentManager;

/// Resources whose changes make the working copy stale.
const WATCHED: [Resource; 3] = [
    Resource::Pages,
    Resource::PageSections,
    Resource::ContentVersions,
];

#[derive(Default)]
struct Following {
    path: Option<PagePath>,
    subscriptions: Vec<Subscription>,
}

pub struct ChangeBridge {
    manager: Arc<ContentManager>,
    feed: Arc<dyn ChangeFeed>,
    following: Mutex<Following>,
}

impl ChangeBridge {
    pub fn new(manager: Arc<ContentManager>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            manager,
            feed,
            following: Mutex::default(),
        }
    }

    pub fn manager(&self) -> &Arc<ContentManager> {
        &self.manager
    }

    /// Path currently followed, if any.
    pub fn followed_path(&self) -> Option<PagePath> {
        self.lock().path.clone()
    }

    /// Whether every watched resource has a live subscription.
    pub fn is_subscribed(&self) -> bool {
        let following = self.lock();
        following.subscriptions.len() == WATCHED.len()
            && following.subscriptions.iter().all(Subscription::is_active)
    }

    /// Follow `path`, replacing subscriptions for any previous path.
    ///
    /// Subscription errors are logged and not returned: without live
    /// updates the editor still works, only without automatic refresh.
    pub fn follow(&self, path: &PagePath) {
        let mut following = self.lock();
        if following.path.as_ref() == Some(path) && !following.subscriptions.is_empty() {
            return;
        }
        following.subscriptions.clear();
        following.path = Some(path.clone());

        for resource in WATCHED {
            let filter = ChangeFilter::resource(resource).for_path(path.clone());
            match self.feed.subscribe(filter, self.callback()) {
                Ok(subscription) => following.subscriptions.push(subscription),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        page_path = %path,
                        resource = %resource,
                        "Change subscription failed, live updates disabled"
                    );
                }
            }
        }
    }

    /// Follow `path` and load it into the manager.
    pub async fn navigate(&self, path: &PagePath) -> Result<(), ContentError> {
        self.follow(path);
        self.manager.load_page(path).await
    }

    /// Drop every subscription. Also happens when the bridge is dropped.
    pub fn teardown(&self) {
        let mut following = self.lock();
        following.subscriptions.clear();
        following.path = None;
    }

    fn lock(&self) -> MutexGuard<'_, Following> {
        self.following.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn callback(&self) -> pagewright_events::ChangeCallback {
        let manager = Arc::downgrade(&self.manager);
        let own_origin = self.manager.id();

        Arc::new(move |event: ChangeEvent| {
            if event.origin == Some(own_origin) {
                return;
            }
            let Some(manager) = manager.upgrade() else {
                return;
            };
            tokio::spawn(async move {
                if manager.active_path().as_ref() != Some(&event.page_path) {
                    return;
                }
                tracing::debug!(
                    page_path = %event.page_path,
                    resource = %event.resource,
                    "Remote change, reloading page"
                );
                match manager.load_page(&event.page_path).await {
                    Ok(()) | Err(ContentError::Stale { .. }) => {}
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            page_path = %event.page_path,
                            "Reload after remote change failed"
                        );
                    }
                }
            });
        })
    }
}
