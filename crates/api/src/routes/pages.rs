use axum::routing::get;
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Page routes mounted at `/pages`.
///
/// ```text
/// GET /                 -> list_pages
/// GET /lookup?path=     -> get_page
/// GET /versions?path=   -> list_versions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::list_pages))
        .route("/lookup", get(pages::get_page))
        .route("/versions", get(pages::list_versions))
}
