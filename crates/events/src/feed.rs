//! The subscribe/unsubscribe interface consumed by the synchronization layer.
//!
//! Consumers depend on [`ChangeFeed`] only, never on a concrete channel, so
//! the backend that produces events is swappable. A [`Subscription`] is a
//! cancellable handle: dropping it stops delivery.

use std::sync::Arc;

use pagewright_core::page_path::PagePath;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bus::{ChangeBus, ChangeEvent, Resource};

/// Callback invoked for every matching event, on the subscription's task.
pub type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Predicate selecting which events reach a subscriber. Unset parts match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    pub resource: Option<Resource>,
    pub page_path: Option<PagePath>,
}

impl ChangeFilter {
    /// Match every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match events on one resource collection.
    pub fn resource(resource: Resource) -> Self {
        Self {
            resource: Some(resource),
            page_path: None,
        }
    }

    /// Narrow the filter to one page path.
    pub fn for_path(mut self, path: PagePath) -> Self {
        self.page_path = Some(path);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.resource.is_none_or(|r| r == event.resource)
            && self.page_path.as_ref().is_none_or(|p| *p == event.page_path)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscribeError {
    #[error("no async runtime available to deliver events")]
    NoRuntime,

    #[error("change feed is closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// Subscription handle
// ---------------------------------------------------------------------------

/// Live subscription. Delivery stops when the handle is dropped or
/// [`unsubscribe`](Self::unsubscribe)d.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a delivery task that exits once `token` is cancelled.
    pub fn new(token: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            id: Uuid::new_v4(),
            token,
            handle: Some(handle),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether events can still be delivered.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel delivery and wait until the delivery task has exited.
    pub async fn unsubscribe(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, subscription = %self.id, "Subscription task failed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

// ---------------------------------------------------------------------------
// ChangeFeed
// ---------------------------------------------------------------------------

/// A source of change events with filtered, cancellable subscriptions.
pub trait ChangeFeed: Send + Sync {
    /// Deliver every event matching `filter` to `callback` until the
    /// returned handle is dropped.
    fn subscribe(
        &self,
        filter: ChangeFilter,
        callback: ChangeCallback,
    ) -> Result<Subscription, SubscribeError>;

    /// Announce a change to all matching subscribers.
    fn publish(&self, event: ChangeEvent);
}

impl ChangeFeed for ChangeBus {
    fn subscribe(
        &self,
        filter: ChangeFilter,
        callback: ChangeCallback,
    ) -> Result<Subscription, SubscribeError> {
        if self.is_closed() {
            return Err(SubscribeError::Closed);
        }
        let runtime = Handle::try_current().map_err(|_| SubscribeError::NoRuntime)?;

        let token = CancellationToken::new();
        let handle = runtime.spawn(deliver(
            self.receiver(),
            filter,
            callback,
            token.clone(),
            self.shutdown_token(),
        ));
        Ok(Subscription::new(token, handle))
    }

    fn publish(&self, event: ChangeEvent) {
        ChangeBus::publish(self, event);
    }
}

/// Delivery loop for one subscription.
async fn deliver(
    mut receiver: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
    callback: ChangeCallback,
    token: CancellationToken,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = shutdown.cancelled() => break,
            received = receiver.recv() => match received {
                Ok(event) => {
                    if filter.matches(&event) {
                        callback(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Change subscription lagged, some events were not delivered"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    tracing::debug!(filter = ?filter, "Change subscription ended");
}
