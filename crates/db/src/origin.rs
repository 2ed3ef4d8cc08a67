//! Change-origin tagging for writes.
//!
//! The change-notification trigger reads the transaction-local
//! `pagewright.origin` setting and includes it in every notification, so a
//! writer can recognise (and ignore) the echo of its own change.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Name of the session setting read by `notify_content_change()`.
pub const ORIGIN_SETTING: &str = "pagewright.origin";

/// Begin a transaction, tagging it with `origin` when one is given.
pub async fn begin_tagged(
    pool: &PgPool,
    origin: Option<Uuid>,
) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    if let Some(origin) = origin {
        sqlx::query("SELECT set_config($1, $2, true)")
            .bind(ORIGIN_SETTING)
            .bind(origin.to_string())
            .execute(&mut *tx)
            .await?;
    }
    Ok(tx)
}
