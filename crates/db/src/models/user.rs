//! User entity model and DTOs.

use onboard_core::admission::AccountSnapshot;
use onboard_core::status::{AccountStatus, StatusId};
use onboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash and the last OTP -- NEVER serialize this to API
/// responses directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub country_code: String,
    pub mobile: String,
    pub password_hash: String,
    pub otp: Option<String>,
    pub is_otp_verified: bool,
    pub status_id: StatusId,
    pub login_count: i32,
    pub is_primary_account_holder: bool,
    pub profile_image_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Decoded account status. Unknown ids are rejected by the table's CHECK
    /// constraint, so `None` only shows up on a schema mismatch.
    pub fn status(&self) -> Option<AccountStatus> {
        AccountStatus::from_id(self.status_id)
    }

    /// The fields the admission controller works with.
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            login_count: self.login_count,
            is_primary_account_holder: self.is_primary_account_holder,
        }
    }
}

/// Safe user representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub country_code: String,
    pub mobile: String,
    pub is_otp_verified: bool,
    /// Status name (e.g. `"ACTIVE"`).
    pub status: Option<AccountStatus>,
    pub login_count: i32,
    pub is_primary_account_holder: bool,
    pub profile_image_key: Option<String>,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            country_code: user.country_code.clone(),
            mobile: user.mobile.clone(),
            is_otp_verified: user.is_otp_verified,
            status: user.status(),
            login_count: user.login_count,
            is_primary_account_holder: user.is_primary_account_holder,
            profile_image_key: user.profile_image_key.clone(),
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. New accounts start INACTIVE until the
/// mobile number is verified.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub country_code: String,
    pub mobile: String,
    pub password_hash: String,
    pub is_primary_account_holder: bool,
}
