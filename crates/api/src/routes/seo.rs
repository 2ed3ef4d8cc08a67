use axum::routing::get;
use axum::Router;

use crate::handlers::seo;
use crate::state::AppState;

/// SEO routes mounted at `/seo`.
///
/// ```text
/// GET /?path=   -> get_seo (public)
/// PUT /?path=   -> update_seo
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(seo::get_seo).put(seo::update_seo))
}
