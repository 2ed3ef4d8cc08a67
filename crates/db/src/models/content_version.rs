//! Content version model (append-only).
//!
//! Versions are immutable snapshots of a page's full content, created only
//! by an explicit save.

use pagewright_core::page_path::PagePath;
use pagewright_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `content_versions` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ContentVersion {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub page_path: PagePath,
    pub content_data: serde_json::Value,
    pub version_number: i32,
    pub change_description: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for inserting a version snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateContentVersion {
    pub page_path: PagePath,
    pub content_data: serde_json::Value,
    pub version_number: i32,
    pub change_description: Option<String>,
    pub created_by: Option<DbId>,
}
