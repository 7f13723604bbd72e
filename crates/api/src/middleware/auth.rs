//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use onboard_core::error::CoreError;
use onboard_core::types::DbId;
use onboard_db::repositories::SessionRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated device extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// The token must be valid *and* its device session must still be ACTIVE, so
/// a device evicted by the admission controller or logged out is rejected
/// even before its token expires. Each accepted request refreshes the
/// session's `last_recent_activity`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The account's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The device session the token is bound to (from `claims.sid`).
    pub session_id: DbId,
    pub name: String,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let session = SessionRepo::find_by_id(&state.pool, claims.sid).await?;
        match session {
            Some(s) if s.user_id == claims.sub && s.is_active() => {}
            _ => {
                return Err(AppError::Core(CoreError::Unauthorized(
                    "Session is no longer active".into(),
                )))
            }
        }
        SessionRepo::touch(&state.pool, claims.sid).await?;

        Ok(AuthUser {
            user_id: claims.sub,
            session_id: claims.sid,
            name: claims.name,
            email: claims.email,
        })
    }
}
