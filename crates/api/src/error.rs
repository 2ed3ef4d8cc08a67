use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagewright_content::{BackendError, ContentError};
use pagewright_core::error::CoreError;
use pagewright_core::validation::{FieldViolation, ValidationError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies,
/// plus a `violations` list for field validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Content(ContentError::Validation(err))
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        Self::Content(ContentError::Backend(err))
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut violations: Option<&[FieldViolation]> = None;

        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Content(content) => match content {
                ContentError::Backend(backend) => classify_backend_error(backend),
                ContentError::Validation(err) => {
                    violations = Some(&err.violations);
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
                }
                ContentError::NotLoaded { .. } => {
                    (StatusCode::CONFLICT, "NOT_LOADED", content.to_string())
                }
                ContentError::Stale { .. } => (StatusCode::CONFLICT, "STALE", content.to_string()),
                ContentError::SectionNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", content.to_string())
                }
                ContentError::Serialization(err) => internal(err),
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(violations) = violations {
            body["violations"] = json!(violations);
        }

        (status, axum::Json(body)).into_response()
    }
}

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string()),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => internal(msg),
    }
}

fn classify_backend_error(err: &BackendError) -> (StatusCode, &'static str, String) {
    match err {
        BackendError::Unavailable(_) => {
            tracing::warn!(error = %err, "Content backend unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "BACKEND_UNAVAILABLE",
                "The content backend is unavailable".to_string(),
            )
        }
        BackendError::Conflict(constraint) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        BackendError::PermissionDenied(_) => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Permission denied by the content backend".to_string(),
        ),
        BackendError::Query(_) => internal(err),
    }
}

/// Unique violations (`uq_` constraints) map to 409, everything else to a
/// sanitized 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint().is_some_and(|c| c.starts_with("uq_")) =>
        {
            (
                StatusCode::CONFLICT,
                "CONFLICT",
                format!(
                    "Duplicate value violates unique constraint: {}",
                    db_err.constraint().unwrap_or_default()
                ),
            )
        }
        other => internal(other),
    }
}
