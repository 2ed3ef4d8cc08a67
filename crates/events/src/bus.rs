//! In-process change bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ChangeBus`] is shared via `Arc<ChangeBus>` across the application. The
//! Postgres listener and the content manager publish to it; change bridges
//! subscribe through the [`ChangeFeed`](crate::feed::ChangeFeed) interface.

use std::fmt;

use chrono::{DateTime, Utc};
use pagewright_core::page_path::PagePath;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// Resource collection a change happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Pages,
    PageSections,
    ContentVersions,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pages => "pages",
            Self::PageSections => "page_sections",
            Self::ContentVersions => "content_versions",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// A change to one page's content.
///
/// Constructed via [`ChangeEvent::new`] and tagged with
/// [`with_origin`](ChangeEvent::with_origin) when the writer wants to
/// recognise its own echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub resource: Resource,
    pub action: ChangeAction,

    /// Page the changed row belongs to.
    pub page_path: PagePath,

    /// Id of the writer that caused the change, when known.
    pub origin: Option<Uuid>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(resource: Resource, action: ChangeAction, page_path: PagePath) -> Self {
        Self {
            resource,
            action,
            page_path,
            origin: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the writer id to the event.
    pub fn with_origin(mut self, origin: Uuid) -> Self {
        self.origin = Some(origin);
        self
    }
}

// ---------------------------------------------------------------------------
// ChangeBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out change bus.
///
/// # Usage
///
/// ```rust
/// use pagewright_core::page_path::PagePath;
/// use pagewright_events::bus::{ChangeAction, ChangeBus, ChangeEvent, Resource};
///
/// let bus = ChangeBus::default();
/// let mut rx = bus.receiver();
///
/// bus.publish(ChangeEvent::new(Resource::Pages, ChangeAction::Update, PagePath::root()));
/// ```
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
    shutdown: CancellationToken,
}

impl ChangeBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            shutdown: CancellationToken::new(),
        }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: ChangeEvent) {
        if self.is_closed() {
            return;
        }
        // Ignore the SendError, it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Raw receiver for every event published on this bus.
    pub fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Stop delivery: running subscriptions end and new ones are refused.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Token cancelled by [`close`](Self::close).
    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
