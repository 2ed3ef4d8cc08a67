use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use pagewright_content::ContentStore;

use crate::error::AppResult;
use crate::middleware::auth::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/activity?limit=
///
/// Most recent admin activity entries, newest first.
pub async fn list_activity(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let entries = state.store.list_activity(params.limit()).await?;
    Ok(Json(DataResponse { data: entries }))
}
