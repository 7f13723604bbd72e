//! Records exchanged between the admission controller and its stores.

use serde::{Deserialize, Serialize};

use crate::status::SessionStatus;
use crate::types::{DbId, Timestamp};

/// The slice of an account the admission controller reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub id: DbId,
    pub name: String,
    pub email: String,
    /// Number of slots currently held, `0..=limit`.
    pub login_count: i32,
    pub is_primary_account_holder: bool,
}

/// Device descriptor supplied with a login. Both fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDetails {
    pub device_id: Option<String>,
    pub device_token: Option<String>,
}

impl DeviceDetails {
    /// Trim both fields, turning blank values into `None`.
    pub fn normalized(device_id: Option<String>, device_token: Option<String>) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            device_id: clean(device_id),
            device_token: clean(device_token),
        }
    }
}

/// One device session as seen by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: DbId,
    pub account_id: DbId,
    pub device: DeviceDetails,
    pub status: SessionStatus,
    pub last_recent_activity: Timestamp,
}

/// Identity claims embedded in an issued bearer token besides the ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub name: String,
    pub email: String,
}

/// Result of one `admit_login` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// A new ACTIVE session was created and a token issued for it.
    Admitted { session_id: DbId, token: String },
    /// A primary account holder at the limit logged out one existing session.
    /// The caller is not admitted by this call.
    PrimaryEvicted { session_id: DbId },
    /// A secondary account at the limit freed the longest-idle slot.
    /// The caller is not admitted by this call.
    IdleEvicted { session_id: DbId },
    /// Every slot is held and there is nothing to evict.
    AllBusy,
}

impl AdmissionOutcome {
    /// Machine-readable discriminator for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Admitted { .. } => "admitted",
            Self::PrimaryEvicted { .. } => "primary_evicted",
            Self::IdleEvicted { .. } => "idle_evicted",
            Self::AllBusy => "all_busy",
        }
    }

    /// Human-readable message for API responses.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Admitted { .. } => "Logged In Successfully",
            Self::PrimaryEvicted { .. } => {
                "Primary Account Holder successfully logout the secondary user."
            }
            Self::IdleEvicted { .. } => {
                "Successful in logging out user who have been idle for the longest time"
            }
            Self::AllBusy => "Sorry, all screens are busy.",
        }
    }
}

/// Failure reported by a session or account store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Failure reported by a token issuer.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct IssueError(pub String);

/// Failure reported by a login notifier. Never propagated to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

/// Errors that abort an admission. `AllBusy` is an outcome, not an error.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("Session store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Token issuance failure: {0}")]
    TokenIssuance(#[from] IssueError),
}
