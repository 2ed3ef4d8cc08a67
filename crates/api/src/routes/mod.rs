pub mod admin;
pub mod contact;
pub mod editor;
pub mod health;
pub mod pages;
pub mod seo;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /pages                                            list (admin)
/// /pages/lookup?path=                               page with sections (admin)
/// /pages/versions?path=                             version history (admin)
///
/// /seo?path=                                        resolved SEO (public), update (admin)
///
/// /editor/sessions                                  open (admin)
/// /editor/sessions/{id}                             view, close
/// /editor/sessions/{id}/page                        navigate (PUT)
/// /editor/sessions/{id}/metadata                    update page fields (PATCH)
/// /editor/sessions/{id}/sections                    add section (POST)
/// /editor/sessions/{id}/sections/{section_id}       update (PUT), remove (DELETE)
/// /editor/sessions/{id}/save                        save version (POST)
/// /editor/sessions/{id}/undo                        discard edits (POST)
///
/// /contact                                          submit (public)
///
/// /admin/submissions                                list (admin)
/// /admin/submissions/{id}/status                    update status (PUT)
/// /admin/activity                                   recent activity (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/pages", pages::router())
        .nest("/seo", seo::router())
        .nest("/editor/sessions", editor::router())
        .nest("/contact", contact::router())
        .nest("/admin", admin::router())
}
