//! Repository for the `form_submissions` table.

use pagewright_core::types::DbId;
use sqlx::PgPool;

use crate::models::form_submission::FormSubmission;

const COLUMNS: &str = "id, form_name, payload, status, created_at, updated_at";

/// Provides create, list and status updates for public form submissions.
pub struct FormSubmissionRepo;

impl FormSubmissionRepo {
    /// Store an already-validated submission with status `new`.
    pub async fn create(
        pool: &PgPool,
        form_name: &str,
        payload: &serde_json::Value,
    ) -> Result<FormSubmission, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_submissions (form_name, payload)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormSubmission>(&query)
            .bind(form_name)
            .bind(payload)
            .fetch_one(pool)
            .await
    }

    /// List submissions newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FormSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_submissions
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FormSubmission>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Change a submission's status.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<FormSubmission>, sqlx::Error> {
        let query = format!(
            "UPDATE form_submissions SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormSubmission>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }
}
