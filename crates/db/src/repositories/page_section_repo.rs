//! Repository for the `page_sections` table.
//!
//! Sections are soft-deleted by clearing `is_active`; there is no hard delete.

use pagewright_core::page_path::PagePath;
use pagewright_core::section::DISPLAY_ORDER_STEP;
use pagewright_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use crate::origin::begin_tagged;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, page_path, section_key, title, content, section_type, \
     display_order, is_active, metadata, created_at, updated_at";

/// Provides CRUD operations for page sections.
pub struct PageSectionRepo;

impl PageSectionRepo {
    /// Insert a section. A missing display order appends after the current
    /// last active section.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePageSection,
        origin: Option<Uuid>,
    ) -> Result<PageSection, sqlx::Error> {
        let query = format!(
            "INSERT INTO page_sections
                (page_path, section_key, title, content, section_type, display_order, metadata)
             VALUES ($1, $2, $3, COALESCE($4, ''), $5,
                COALESCE($6, (SELECT COALESCE(MAX(display_order) + $8, 0)
                              FROM page_sections WHERE page_path = $1 AND is_active)),
                COALESCE($7, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        let mut tx = begin_tagged(pool, origin).await?;
        let section = sqlx::query_as::<_, PageSection>(&query)
            .bind(input.page_path.as_str())
            .bind(&input.section_key)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.section_type.as_str())
            .bind(input.display_order)
            .bind(&input.metadata)
            .bind(DISPLAY_ORDER_STEP)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(section)
    }

    /// Find a section by id, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PageSection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM page_sections WHERE id = $1");
        sqlx::query_as::<_, PageSection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a page's sections in display order. Inactive rows are included
    /// only when `include_inactive` is set.
    pub async fn list_by_page(
        pool: &PgPool,
        path: &PagePath,
        include_inactive: bool,
    ) -> Result<Vec<PageSection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_sections
             WHERE page_path = $1 AND ($2 OR is_active)
             ORDER BY display_order, id"
        );
        sqlx::query_as::<_, PageSection>(&query)
            .bind(path.as_str())
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    /// List every active section across all pages, grouped by path and
    /// ordered for display.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<PageSection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_sections
             WHERE is_active
             ORDER BY page_path, display_order, id"
        );
        sqlx::query_as::<_, PageSection>(&query).fetch_all(pool).await
    }

    /// Update a section in place. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePageSection,
        origin: Option<Uuid>,
    ) -> Result<Option<PageSection>, sqlx::Error> {
        let query = format!(
            "UPDATE page_sections SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                section_type = COALESCE($4, section_type),
                display_order = COALESCE($5, display_order),
                metadata = COALESCE($6, metadata),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let mut tx = begin_tagged(pool, origin).await?;
        let section = sqlx::query_as::<_, PageSection>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.section_type.map(|t| t.as_str()))
            .bind(input.display_order)
            .bind(&input.metadata)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(section)
    }

    /// Set the active flag. Returns `true` if the flag changed.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        active: bool,
        origin: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = begin_tagged(pool, origin).await?;
        let result = sqlx::query(
            "UPDATE page_sections SET is_active = $2, updated_at = NOW()
             WHERE id = $1 AND is_active <> $2",
        )
        .bind(id)
        .bind(active)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
