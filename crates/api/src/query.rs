//! Shared query parameter types for API handlers.

use pagewright_core::error::CoreError;
use pagewright_core::page_path::PagePath;
use serde::Deserialize;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 50;
/// Upper bound on any requested page size.
pub const MAX_LIMIT: i64 = 200;

/// `?path=` selector for page-keyed endpoints.
#[derive(Debug, Deserialize)]
pub struct PathParams {
    pub path: String,
}

impl PathParams {
    pub fn page_path(&self) -> Result<PagePath, CoreError> {
        PagePath::parse(&self.path)
    }
}

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
