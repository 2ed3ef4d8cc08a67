//! Repository for the `admin_activity_logs` table.

use sqlx::PgPool;

use crate::models::activity_log::{ActivityLog, CreateActivityLog};

const COLUMNS: &str = "id, admin_user_id, action, entity_type, entity_key, details, created_at";

/// Append-only admin audit trail.
pub struct ActivityLogRepo;

impl ActivityLogRepo {
    /// Record one admin action.
    pub async fn create(
        pool: &PgPool,
        input: &CreateActivityLog,
    ) -> Result<ActivityLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO admin_activity_logs (admin_user_id, action, entity_type, entity_key, details)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActivityLog>(&query)
            .bind(input.admin_user_id)
            .bind(&input.action)
            .bind(&input.entity_type)
            .bind(&input.entity_key)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// Most recent entries first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ActivityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM admin_activity_logs ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, ActivityLog>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
