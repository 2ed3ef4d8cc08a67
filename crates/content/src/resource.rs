//! Resource access functions.
//!
//! Thin request/response wrappers over a [`ContentStore`]. They translate
//! application intents into store calls and return typed results; they
//! hold no state.

use std::collections::HashMap;

use chrono::Utc;
use pagewright_core::page_path::PagePath;
use pagewright_core::section::validate_section_key;
use pagewright_core::seo::validate_seo;
use pagewright_core::types::DbId;
use pagewright_core::validation::ValidationError;
use pagewright_db::models::activity_log::CreateActivityLog;
use pagewright_db::models::content_version::{ContentVersion, CreateContentVersion};
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::{CreatePageSection, PageSection, UpdatePageSection};
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, ContentError};
use crate::store::{Actor, ContentStore};

/// A page record with its active sections in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub page: PageRecord,
    pub sections: Vec<PageSection>,
}

impl PageContent {
    /// Content for a path with no stored record yet. Nothing is persisted
    /// until the first write.
    pub fn blank(page_path: PagePath) -> Self {
        let now = Utc::now();
        Self {
            page: PageRecord {
                page_path,
                title: String::new(),
                meta_title: None,
                meta_description: None,
                keywords: None,
                canonical_url: None,
                og_title: None,
                og_description: None,
                og_image: None,
                twitter_card: None,
                twitter_title: None,
                twitter_description: None,
                twitter_image: None,
                robots: None,
                is_published: false,
                created_at: now,
                updated_at: now,
                updated_by: None,
            },
            sections: Vec::new(),
        }
    }

    pub fn path(&self) -> &PagePath {
        &self.page.page_path
    }

    /// Sort sections the way the store returns them.
    pub fn sort_sections(&mut self) {
        self.sections
            .sort_by(|a, b| (a.display_order, a.id).cmp(&(b.display_order, b.id)));
    }
}

/// Fetch a page with its active sections.
///
/// `Ok(None)` means there is no record for `path`; a failed query is an
/// `Err`.
pub async fn fetch_page<S: ContentStore + ?Sized>(
    store: &S,
    path: &PagePath,
) -> Result<Option<PageContent>, BackendError> {
    let Some(page) = store.find_page(path).await? else {
        return Ok(None);
    };
    let sections = store.list_sections(path, false).await?;
    Ok(Some(PageContent { page, sections }))
}

/// Fetch every page with its sections grouped by path.
///
/// A failed section query degrades to empty sections for every page rather
/// than failing the whole call.
pub async fn fetch_all_pages<S: ContentStore + ?Sized>(
    store: &S,
) -> Result<Vec<PageContent>, BackendError> {
    let pages = store.list_pages().await?;

    let mut grouped: HashMap<PagePath, Vec<PageSection>> = HashMap::new();
    match store.list_active_sections().await {
        Ok(sections) => {
            for section in sections {
                grouped
                    .entry(section.page_path.clone())
                    .or_default()
                    .push(section);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Section query failed, listing pages without sections");
        }
    }

    Ok(pages
        .into_iter()
        .map(|page| {
            let sections = grouped.remove(&page.page_path).unwrap_or_default();
            PageContent { page, sections }
        })
        .collect())
}

/// Validate and apply a page update in one atomic store request.
pub async fn upsert_page<S: ContentStore + ?Sized>(
    store: &S,
    path: &PagePath,
    fields: &UpdatePage,
    actor: &Actor,
) -> Result<PageRecord, ContentError> {
    validate_seo(&fields.seo)?;
    let page = store.upsert_page(path, fields, actor).await?;
    tracing::info!(page_path = %path, "Page updated");
    Ok(page)
}

/// Add a section, creating the owning page record first if needed.
pub async fn add_section<S: ContentStore + ?Sized>(
    store: &S,
    input: &CreatePageSection,
    actor: &Actor,
) -> Result<PageSection, ContentError> {
    validate_section_key(&input.section_key)
        .map_err(|e| ValidationError::single("section_key", "regex_pattern", e.to_string()))?;

    if store.find_page(&input.page_path).await?.is_none() {
        store
            .upsert_page(&input.page_path, &UpdatePage::default(), actor)
            .await?;
    }
    let section = store.insert_section(input, actor).await?;
    tracing::info!(
        page_path = %section.page_path,
        section_id = section.id,
        section_key = %section.section_key,
        "Section added"
    );
    Ok(section)
}

/// Update a section in place.
pub async fn upsert_section<S: ContentStore + ?Sized>(
    store: &S,
    id: DbId,
    input: &UpdatePageSection,
    actor: &Actor,
) -> Result<PageSection, ContentError> {
    let section = store
        .update_section(id, input, actor)
        .await?
        .ok_or(ContentError::SectionNotFound(id))?;
    tracing::info!(page_path = %section.page_path, section_id = id, "Section updated");
    Ok(section)
}

/// Soft-delete a section by clearing its active flag. Deactivating an
/// already inactive section succeeds.
pub async fn deactivate_section<S: ContentStore + ?Sized>(
    store: &S,
    id: DbId,
    actor: &Actor,
) -> Result<(), ContentError> {
    if store.set_section_active(id, false, actor).await? {
        tracing::info!(section_id = id, "Section deactivated");
        return Ok(());
    }
    match store.find_section(id).await? {
        Some(_) => Ok(()),
        None => Err(ContentError::SectionNotFound(id)),
    }
}

/// Append a version snapshot numbered one past the current maximum.
///
/// Read-then-insert is not atomic: two concurrent savers can compute the
/// same number. The unique `(page_path, version_number)` constraint turns
/// the loser into a [`BackendError::Conflict`].
pub async fn save_version<S: ContentStore + ?Sized>(
    store: &S,
    path: &PagePath,
    snapshot: serde_json::Value,
    description: Option<String>,
    actor: &Actor,
) -> Result<ContentVersion, BackendError> {
    let latest = store.latest_version_number(path).await?;
    let version = store
        .insert_version(&CreateContentVersion {
            page_path: path.clone(),
            content_data: snapshot,
            version_number: latest + 1,
            change_description: description,
            created_by: actor.user_id,
        })
        .await?;
    tracing::info!(
        page_path = %path,
        version_number = version.version_number,
        "Content version saved"
    );
    Ok(version)
}

/// Versions of `path`, newest first.
pub async fn list_versions<S: ContentStore + ?Sized>(
    store: &S,
    path: &PagePath,
) -> Result<Vec<ContentVersion>, BackendError> {
    store.list_versions(path).await
}

/// Record an admin action. A failure is logged and never propagated.
pub async fn record_activity<S: ContentStore + ?Sized>(store: &S, entry: CreateActivityLog) {
    if let Err(e) = store.record_activity(&entry).await {
        tracing::warn!(
            error = %e,
            action = %entry.action,
            entity_key = ?entry.entity_key,
            "Failed to record admin activity"
        );
    }
}
