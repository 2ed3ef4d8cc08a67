//! Page section model and DTOs.
//!
//! Sections are never removed; clearing `is_active` hides them.

use pagewright_core::page_path::PagePath;
use pagewright_core::section::SectionType;
use pagewright_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `page_sections` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PageSection {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub page_path: PagePath,
    pub section_key: String,
    pub title: Option<String>,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub section_type: SectionType,
    pub display_order: i32,
    pub is_active: bool,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for adding a section to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePageSection {
    pub page_path: PagePath,
    pub section_key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub section_type: SectionType,
    /// Appended after the last active section if omitted.
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// DTO for updating a section in place. All fields are optional; the
/// section key and owning page are fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePageSection {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub section_type: Option<SectionType>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl UpdatePageSection {
    /// Apply the set fields to `section` in place.
    pub fn apply_to(&self, section: &mut PageSection) {
        if let Some(title) = &self.title {
            section.title = Some(title.clone());
        }
        if let Some(content) = &self.content {
            section.content = content.clone();
        }
        if let Some(section_type) = self.section_type {
            section.section_type = section_type;
        }
        if let Some(order) = self.display_order {
            section.display_order = order;
        }
        if let Some(metadata) = &self.metadata {
            section.metadata = metadata.clone();
        }
    }
}
