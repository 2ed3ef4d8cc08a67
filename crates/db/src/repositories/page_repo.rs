//! Repository for the `pages` table.

use pagewright_core::page_path::PagePath;
use pagewright_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::page::{PageRecord, UpdatePage};
use crate::origin::begin_tagged;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "page_path, title, meta_title, meta_description, keywords, canonical_url, \
     og_title, og_description, og_image, twitter_card, twitter_title, twitter_description, \
     twitter_image, robots, is_published, created_at, updated_at, updated_by";

/// Provides read and upsert operations for page records. Pages are never
/// deleted; `is_published` controls visibility.
pub struct PageRepo;

impl PageRepo {
    /// Find a page by its path.
    pub async fn find_by_path(
        pool: &PgPool,
        path: &PagePath,
    ) -> Result<Option<PageRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE page_path = $1");
        sqlx::query_as::<_, PageRecord>(&query)
            .bind(path.as_str())
            .fetch_optional(pool)
            .await
    }

    /// List every page ordered by path.
    pub async fn list(pool: &PgPool) -> Result<Vec<PageRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages ORDER BY page_path");
        sqlx::query_as::<_, PageRecord>(&query).fetch_all(pool).await
    }

    /// Create the page on first assignment, otherwise update it. Only
    /// non-`None` fields in `input` are applied. A single statement, so the
    /// update is all-or-nothing. The change notification carries `origin`.
    pub async fn upsert(
        pool: &PgPool,
        path: &PagePath,
        input: &UpdatePage,
        updated_by: Option<DbId>,
        origin: Option<Uuid>,
    ) -> Result<PageRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO pages (page_path, title, meta_title, meta_description, keywords,
                 canonical_url, og_title, og_description, og_image, twitter_card,
                 twitter_title, twitter_description, twitter_image, robots, is_published,
                 updated_by)
             VALUES ($1, COALESCE($2, ''), $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                 $14, COALESCE($15, FALSE), $16)
             ON CONFLICT (page_path) DO UPDATE SET
                title = COALESCE($2, pages.title),
                meta_title = COALESCE($3, pages.meta_title),
                meta_description = COALESCE($4, pages.meta_description),
                keywords = COALESCE($5, pages.keywords),
                canonical_url = COALESCE($6, pages.canonical_url),
                og_title = COALESCE($7, pages.og_title),
                og_description = COALESCE($8, pages.og_description),
                og_image = COALESCE($9, pages.og_image),
                twitter_card = COALESCE($10, pages.twitter_card),
                twitter_title = COALESCE($11, pages.twitter_title),
                twitter_description = COALESCE($12, pages.twitter_description),
                twitter_image = COALESCE($13, pages.twitter_image),
                robots = COALESCE($14, pages.robots),
                is_published = COALESCE($15, pages.is_published),
                updated_by = $16,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        let seo = &input.seo;
        let mut tx = begin_tagged(pool, origin).await?;
        let page = sqlx::query_as::<_, PageRecord>(&query)
            .bind(path.as_str())
            .bind(&input.title)
            .bind(&seo.meta_title)
            .bind(&seo.meta_description)
            .bind(&seo.keywords)
            .bind(&seo.canonical_url)
            .bind(&seo.og_title)
            .bind(&seo.og_description)
            .bind(&seo.og_image)
            .bind(&seo.twitter_card)
            .bind(&seo.twitter_title)
            .bind(&seo.twitter_description)
            .bind(&seo.twitter_image)
            .bind(&seo.robots)
            .bind(input.is_published)
            .bind(updated_by)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(page)
    }
}
