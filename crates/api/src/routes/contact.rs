use axum::routing::post;
use axum::Router;

use crate::handlers::contact;
use crate::state::AppState;

/// Public contact form route mounted at `/contact`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(contact::submit_contact))
}
