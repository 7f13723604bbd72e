//! Domain error taxonomy shared by every crate above `onboard-core`.

use crate::types::DbId;

/// Failures a request can end in, independent of transport.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed input, or a password change that breaks the password rules.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Email or mobile number already registered.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, invalid or revoked credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The account exists but may not sign in (blocked or deleted).
    #[error("Forbidden: {0}")]
    Forbidden(String),
}
