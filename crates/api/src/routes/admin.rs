use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{activity, contact};
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
///
/// ```text
/// GET /submissions               -> list_submissions
/// PUT /submissions/{id}/status   -> update_submission_status
/// GET /activity                  -> list_activity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submissions", get(contact::list_submissions))
        .route(
            "/submissions/{id}/status",
            put(contact::update_submission_status),
        )
        .route("/activity", get(activity::list_activity))
}
