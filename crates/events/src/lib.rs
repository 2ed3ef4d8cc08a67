//! Change notification for page content.
//!
//! - [`ChangeBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ChangeEvent`]: a row-level change to a page, its sections or its
//!   version log.
//! - [`ChangeFeed`]: the abstract `subscribe(filter) -> handle` interface the
//!   synchronization layer depends on.
//! - [`PgChangeListener`]: background task that relays Postgres
//!   notifications onto the bus.

pub mod bus;
pub mod feed;
pub mod listener;

pub use bus::{ChangeAction, ChangeBus, ChangeEvent, Resource};
pub use feed::{ChangeCallback, ChangeFeed, ChangeFilter, SubscribeError, Subscription};
pub use listener::{PgChangeListener, CHANGE_CHANNEL};
