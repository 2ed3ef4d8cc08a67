//! Public form submission model.

use pagewright_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `form_submissions` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct FormSubmission {
    pub id: DbId,
    pub form_name: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for updating a submission's workflow status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubmissionStatus {
    pub status: String,
}
