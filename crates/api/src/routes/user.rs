//! Route definitions for the `/user` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, user};
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// POST /signup           -> signup
/// POST /verify-otp       -> verify_otp
/// POST /login            -> login
/// POST /forgot-password  -> forgot_password
/// POST /reset-password   -> reset_password
/// POST /change-password  -> change_password (requires auth)
/// GET  /details          -> details (requires auth)
/// POST /profile-image    -> upload_profile_image (requires auth)
/// POST /logout           -> logout (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/change-password", post(auth::change_password))
        .route("/details", get(user::details))
        .route("/profile-image", post(user::upload_profile_image))
        .route("/logout", post(auth::logout))
}
