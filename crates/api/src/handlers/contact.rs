//! Public contact form intake and admin submission management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pagewright_content::resource;
use pagewright_core::error::CoreError;
use pagewright_core::forms::{validate_submission_status, CONTACT_FORM};
use pagewright_core::types::DbId;
use pagewright_db::models::activity_log::CreateActivityLog;
use pagewright_db::models::form_submission::UpdateSubmissionStatus;
use pagewright_db::repositories::FormSubmissionRepo;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::AppResult;
use crate::middleware::auth::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/contact
///
/// Validate a submission against the enabled contact form fields and store
/// it with status `new`. Unknown and disabled fields are dropped.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(input): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let cleaned = state.config.contact_form.clean(&input)?;
    let submission =
        FormSubmissionRepo::create(&state.pool, CONTACT_FORM, &Value::Object(cleaned)).await?;

    tracing::info!(submission_id = submission.id, "Contact form submitted");
    Ok((StatusCode::CREATED, Json(DataResponse { data: submission })))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/admin/submissions?status=&limit=&offset=
pub async fn list_submissions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<SubmissionListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &params.status {
        validate_submission_status(status)?;
    }
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let submissions = FormSubmissionRepo::list(
        &state.pool,
        params.status.as_deref(),
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: submissions }))
}

/// PUT /api/v1/admin/submissions/{id}/status
pub async fn update_submission_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSubmissionStatus>,
) -> AppResult<impl IntoResponse> {
    validate_submission_status(&input.status)?;
    let submission = FormSubmissionRepo::update_status(&state.pool, id, &input.status)
        .await?
        .ok_or_else(|| CoreError::not_found("FormSubmission", id))?;

    resource::record_activity(
        state.store.as_ref(),
        CreateActivityLog::new(
            Some(admin.user_id),
            "submission.status",
            "form_submission",
            Some(id.to_string()),
        )
        .with_details(json!({ "status": submission.status })),
    )
    .await;

    Ok(Json(DataResponse { data: submission }))
}
