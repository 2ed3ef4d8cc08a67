//! User-visible, non-blocking notifications emitted by the content manager.

use pagewright_core::page_path::PagePath;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A toast-style message for the editor view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub page_path: Option<PagePath>,
}

impl Notice {
    pub fn info(page_path: Option<PagePath>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            page_path,
        }
    }

    pub fn error(page_path: Option<PagePath>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            page_path,
        }
    }
}
