use pagewright_core::page_path::PagePath;
use pagewright_core::types::DbId;
use pagewright_core::validation::ValidationError;

/// Transport or query failure from a [`ContentStore`](crate::store::ContentStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let detail = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                match db_err.code().as_deref() {
                    Some("23505") => Self::Conflict(detail),
                    Some("42501") => Self::PermissionDenied(detail),
                    _ => Self::Query(db_err.message().to_string()),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}

/// Errors from the synchronization layer.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operation needs a working copy of `path`, and none is loaded.
    #[error("No working copy is loaded for {path}")]
    NotLoaded { path: PagePath },

    /// The result arrived after the working copy moved on and was discarded.
    #[error("Result for {path} was superseded and discarded")]
    Stale { path: PagePath },

    #[error("Section {0} not found")]
    SectionNotFound(DbId),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ContentError {
    /// Whether the error is the internal race guard, never shown to users.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_unavailable() {
        let err = BackendError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[test]
    fn row_not_found_is_a_query_error() {
        let err = BackendError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, BackendError::Query(_)));
    }

    #[test]
    fn stale_is_flagged() {
        let err = ContentError::Stale {
            path: PagePath::root(),
        };
        assert!(err.is_stale());
        assert!(!ContentError::SectionNotFound(1).is_stale());
    }
}
