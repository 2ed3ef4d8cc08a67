//! Editor session endpoints.
//!
//! Each session wraps a content manager whose working copy follows one page
//! at a time. Mutations answer with the session view so clients can render
//! the reconciled working copy and the changed-field list.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pagewright_content::{ContentError, EditorSnapshot, NewSection};
use pagewright_core::page_path::PagePath;
use pagewright_core::types::{DbId, Timestamp};
use pagewright_db::models::page::UpdatePage;
use pagewright_db::models::page_section::UpdatePageSection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editor::EditorSession;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub opened_at: Timestamp,
    /// Whether remote changes are currently being followed.
    pub live: bool,
    #[serde(flatten)]
    pub snapshot: EditorSnapshot,
}

impl SessionView {
    fn of(session: &EditorSession) -> Self {
        Self {
            id: session.id,
            opened_at: session.opened_at,
            live: session.bridge.is_subscribed(),
            snapshot: session.manager().snapshot(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenSession {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Navigate {
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveChanges {
    #[serde(default)]
    pub description: Option<String>,
}

fn open_path(session: &EditorSession) -> AppResult<PagePath> {
    session
        .manager()
        .active_path()
        .ok_or_else(|| AppError::BadRequest("No page is open in this editor session".into()))
}

/// A result superseded by a reload, undo or newer navigation carries no
/// error for the client: the session view already shows the newer state.
fn settle<T>(result: Result<T, ContentError>) -> AppResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ContentError::Stale { path }) => {
            tracing::debug!(page_path = %path, "Superseded editor result, answering with current view");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn view(session: &EditorSession) -> Json<DataResponse<SessionView>> {
    Json(DataResponse {
        data: SessionView::of(session),
    })
}

/// POST /api/v1/editor/sessions
///
/// Open a session, optionally loading `path` right away.
pub async fn open_session(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<OpenSession>,
) -> AppResult<impl IntoResponse> {
    let path = input.path.as_deref().map(PagePath::parse).transpose()?;

    let session = state
        .sessions
        .open(
            admin.user_id,
            Arc::clone(&state.store),
            state.change_bus.clone(),
            &state.config.content,
        )
        .await;

    if let Some(path) = path {
        if let Err(e) = settle(session.bridge.navigate(&path).await) {
            state.sessions.close(session.id, admin.user_id).await?;
            return Err(e);
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SessionView::of(&session),
        }),
    ))
}

/// GET /api/v1/editor/sessions/{id}
pub async fn get_session(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let session = state.sessions.get(id, admin.user_id).await?;
    Ok(view(&session))
}

/// DELETE /api/v1/editor/sessions/{id}
pub async fn close_session(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.sessions.close(id, admin.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/editor/sessions/{id}/page
///
/// Follow and load another page. Unsaved edits of the previous page are
/// discarded.
pub async fn navigate(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<Navigate>,
) -> AppResult<impl IntoResponse> {
    let path = PagePath::parse(&input.path)?;
    let session = state.sessions.get(id, admin.user_id).await?;
    settle(session.bridge.navigate(&path).await)?;
    Ok(view(&session))
}

/// PATCH /api/v1/editor/sessions/{id}/metadata
pub async fn update_metadata(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePage>,
) -> AppResult<impl IntoResponse> {
    let session = state.sessions.get(id, admin.user_id).await?;
    let path = open_path(&session)?;
    settle(session.manager().update_metadata(&path, input).await)?;
    Ok(view(&session))
}

/// POST /api/v1/editor/sessions/{id}/sections
///
/// Answers 201 with the stored section, or 200 with the session view when
/// the page was reloaded before the store answered.
pub async fn add_section(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewSection>,
) -> AppResult<Response> {
    let session = state.sessions.get(id, admin.user_id).await?;
    let path = open_path(&session)?;
    let response = match settle(session.manager().add_section(&path, input).await)? {
        Some(section) => (StatusCode::CREATED, Json(DataResponse { data: section })).into_response(),
        None => view(&session).into_response(),
    };
    Ok(response)
}

/// PUT /api/v1/editor/sessions/{id}/sections/{section_id}
pub async fn update_section(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, DbId)>,
    Json(input): Json<UpdatePageSection>,
) -> AppResult<impl IntoResponse> {
    let session = state.sessions.get(id, admin.user_id).await?;
    let path = open_path(&session)?;
    settle(
        session
            .manager()
            .update_section(&path, section_id, input)
            .await,
    )?;
    Ok(view(&session))
}

/// DELETE /api/v1/editor/sessions/{id}/sections/{section_id}
pub async fn remove_section(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, DbId)>,
) -> AppResult<impl IntoResponse> {
    let session = state.sessions.get(id, admin.user_id).await?;
    let path = open_path(&session)?;
    settle(session.manager().remove_section(&path, section_id).await)?;
    Ok(view(&session))
}

/// POST /api/v1/editor/sessions/{id}/save
///
/// Store the working copy as a new content version.
pub async fn save(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SaveChanges>,
) -> AppResult<impl IntoResponse> {
    let session = state.sessions.get(id, admin.user_id).await?;
    let path = open_path(&session)?;
    let version = session
        .manager()
        .save_changes(&path, input.description)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// POST /api/v1/editor/sessions/{id}/undo
///
/// Reset the working copy to the last loaded or saved state.
pub async fn undo(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let session = state.sessions.get(id, admin.user_id).await?;
    session.manager().undo_changes();
    Ok(view(&session))
}
