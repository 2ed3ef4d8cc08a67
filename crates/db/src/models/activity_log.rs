//! Admin activity log model.

use pagewright_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `admin_activity_logs` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: DbId,
    pub admin_user_id: Option<DbId>,
    pub action: String,
    pub entity_type: String,
    pub entity_key: Option<String>,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for recording an admin action.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateActivityLog {
    pub admin_user_id: Option<DbId>,
    pub action: String,
    pub entity_type: String,
    pub entity_key: Option<String>,
    pub details: serde_json::Value,
}

impl CreateActivityLog {
    pub fn new(
        admin_user_id: Option<DbId>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_key: Option<String>,
    ) -> Self {
        Self {
            admin_user_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_key,
            details: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
