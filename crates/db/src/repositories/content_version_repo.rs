//! Repository for the `content_versions` table.
//!
//! Versions are append-only: there is no update or delete.

use pagewright_core::page_path::PagePath;
use sqlx::PgPool;

use crate::models::content_version::{ContentVersion, CreateContentVersion};

/// Column list for content_versions queries.
const COLUMNS: &str =
    "id, page_path, content_data, version_number, change_description, created_by, created_at";

/// Provides read and create operations for content versions.
pub struct ContentVersionRepo;

impl ContentVersionRepo {
    /// Insert a version snapshot.
    pub async fn create(
        pool: &PgPool,
        input: &CreateContentVersion,
    ) -> Result<ContentVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions
                (page_path, content_data, version_number, change_description, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(input.page_path.as_str())
            .bind(&input.content_data)
            .bind(input.version_number)
            .bind(&input.change_description)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// List all versions for a page, newest first.
    pub async fn list_by_page(
        pool: &PgPool,
        path: &PagePath,
    ) -> Result<Vec<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE page_path = $1
             ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(path.as_str())
            .fetch_all(pool)
            .await
    }

    /// Find a specific version of a page.
    pub async fn find_by_page_and_version(
        pool: &PgPool,
        path: &PagePath,
        version_number: i32,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE page_path = $1 AND version_number = $2"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(path.as_str())
            .bind(version_number)
            .fetch_optional(pool)
            .await
    }

    /// Get the latest version number for a page (0 if none exist).
    pub async fn get_latest_version_number(
        pool: &PgPool,
        path: &PagePath,
    ) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as(
            "SELECT COALESCE(MAX(version_number), 0) FROM content_versions WHERE page_path = $1",
        )
        .bind(path.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(result.map(|(v,)| v).unwrap_or(0))
    }
}
