//! Route definitions for the `/notification` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notification`.
///
/// ```text
/// POST /send  -> send
/// GET  /list  -> list
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(notification::send))
        .route("/list", get(notification::list))
}
