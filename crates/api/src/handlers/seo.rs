//! SEO metadata endpoints: public resolved reads and admin writes.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use pagewright_content::Actor;
use pagewright_core::seo::SeoFields;

use crate::error::AppResult;
use crate::middleware::auth::RequireAdmin;
use crate::query::PathParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/seo?path=
///
/// Stored values backfilled with the path's defaults. Public.
pub async fn get_seo(
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
) -> AppResult<impl IntoResponse> {
    let path = params.page_path()?;
    let seo = state.seo_cache.get(&path).await?;
    Ok(Json(DataResponse { data: seo }))
}

/// PUT /api/v1/seo?path=
///
/// Validate and store SEO fields. Omitted fields keep their stored value.
pub async fn update_seo(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
    Json(fields): Json<SeoFields>,
) -> AppResult<impl IntoResponse> {
    let path = params.page_path()?;
    let seo = state
        .seo_cache
        .save(&path, &fields, &Actor::user(admin.user_id))
        .await?;

    tracing::info!(page_path = %path, user_id = admin.user_id, "SEO metadata updated");
    Ok(Json(DataResponse { data: seo }))
}
