//! Postgres change source.
//!
//! Triggers on `pages` and `page_sections` call `pg_notify` on
//! [`CHANGE_CHANNEL`]. [`PgChangeListener`] `LISTEN`s on that channel and
//! republishes every notification on the [`ChangeBus`] until cancelled.

use std::sync::Arc;
use std::time::Duration;

use pagewright_core::page_path::PagePath;
use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bus::{ChangeAction, ChangeBus, ChangeEvent, Resource};

/// Notification channel used by the `notify_content_change()` trigger.
pub const CHANGE_CHANNEL: &str = "content_changes";

/// Pause before retrying after the listener connection fails.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Payload written by the trigger.
#[derive(Debug, Deserialize)]
struct NotifyPayload {
    resource: Resource,
    action: ChangeAction,
    page_path: PagePath,
    #[serde(default)]
    origin: Option<Uuid>,
}

/// Parse a trigger payload into a [`ChangeEvent`].
pub fn parse_payload(payload: &str) -> Result<ChangeEvent, serde_json::Error> {
    let raw: NotifyPayload = serde_json::from_str(payload)?;
    let event = ChangeEvent::new(raw.resource, raw.action, raw.page_path);
    Ok(match raw.origin {
        Some(origin) => event.with_origin(origin),
        None => event,
    })
}

/// Relays database change notifications onto the bus.
pub struct PgChangeListener {
    listener: PgListener,
}

impl PgChangeListener {
    /// Open a dedicated connection and start listening. Notifications
    /// committed after this returns are guaranteed to be relayed.
    pub async fn connect(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        Ok(Self { listener })
    }

    /// Run the relay loop until `cancel` fires.
    ///
    /// Malformed payloads are logged and skipped. Connection failures are
    /// logged and retried; the listener reconnects on the next receive.
    pub async fn run(mut self, bus: Arc<ChangeBus>, cancel: CancellationToken) {
        tracing::info!(channel = CHANGE_CHANNEL, "Change listener started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = self.listener.recv() => match received {
                    Ok(notification) => match parse_payload(notification.payload()) {
                        Ok(event) => {
                            tracing::debug!(
                                resource = %event.resource,
                                page_path = %event.page_path,
                                "Relaying change notification"
                            );
                            bus.publish(event);
                        }
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                payload = notification.payload(),
                                "Skipping malformed change notification"
                            );
                        }
                    },
                    Err(e) => {
                        tracing::error!(error = %e, "Change listener connection failed");
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(RETRY_DELAY) => {}
                        }
                    }
                },
            }
        }
        tracing::info!("Change listener shutting down");
    }
}
