//! Admin read endpoints for pages, their sections and version history.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use pagewright_content::resource;
use pagewright_core::error::CoreError;

use crate::error::AppResult;
use crate::middleware::auth::RequireAdmin;
use crate::query::PathParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/pages
///
/// Every page with its active sections.
pub async fn list_pages(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let pages = resource::fetch_all_pages(state.store.as_ref()).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// GET /api/v1/pages/lookup?path=
pub async fn get_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
) -> AppResult<impl IntoResponse> {
    let path = params.page_path()?;
    let page = resource::fetch_page(state.store.as_ref(), &path)
        .await?
        .ok_or_else(|| CoreError::not_found("Page", &path))?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/pages/versions?path=
///
/// Saved versions of a page, newest first.
pub async fn list_versions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
) -> AppResult<impl IntoResponse> {
    let path = params.page_path()?;
    let versions = resource::list_versions(state.store.as_ref(), &path).await?;
    Ok(Json(DataResponse { data: versions }))
}
