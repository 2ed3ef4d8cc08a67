use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::editor;
use crate::state::AppState;

/// Editor session routes mounted at `/editor/sessions`.
///
/// ```text
/// POST   /                              -> open_session
/// GET    /{id}                          -> get_session
/// DELETE /{id}                          -> close_session
/// PUT    /{id}/page                     -> navigate
/// PATCH  /{id}/metadata                 -> update_metadata
/// POST   /{id}/sections                 -> add_section
/// PUT    /{id}/sections/{section_id}    -> update_section
/// DELETE /{id}/sections/{section_id}    -> remove_section
/// POST   /{id}/save                     -> save
/// POST   /{id}/undo                     -> undo
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(editor::open_session))
        .route(
            "/{id}",
            get(editor::get_session).delete(editor::close_session),
        )
        .route("/{id}/page", put(editor::navigate))
        .route(
            "/{id}/metadata",
            axum::routing::patch(editor::update_metadata),
        )
        .route("/{id}/sections", post(editor::add_section))
        .route(
            "/{id}/sections/{section_id}",
            put(editor::update_section).delete(editor::remove_section),
        )
        .route("/{id}/save", post(editor::save))
        .route("/{id}/undo", post(editor::undo))
}
