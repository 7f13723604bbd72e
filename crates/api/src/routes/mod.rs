pub mod health;
pub mod notification;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /user/signup                                     register, send OTP (public)
/// /user/verify-otp                                 verify OTP, admit device (public)
/// /user/login                                      password login, admit device (public)
/// /user/forgot-password                            mail reset instructions (public)
/// /user/reset-password                             set new password (public)
/// /user/change-password                            set new password (requires auth)
/// /user/details                                    own account (requires auth)
/// /user/profile-image                              upload image (requires auth)
/// /user/logout                                     release device slot (requires auth)
///
/// /notification/send                               push + record (requires auth)
/// /notification/list                               received notifications (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/user", user::router())
        .nest("/notification", notification::router())
}
