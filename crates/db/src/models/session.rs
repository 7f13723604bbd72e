//! Device session model.

use onboard_core::admission::{DeviceDetails, SessionRecord};
use onboard_core::status::{SessionStatus, StatusId};
use onboard_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub device_id: Option<String>,
    pub device_token: Option<String>,
    pub status_id: StatusId,
    pub last_recent_activity: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSession {
    pub fn is_active(&self) -> bool {
        self.status_id == SessionStatus::Active.id()
    }
}

impl TryFrom<UserSession> for SessionRecord {
    /// The unrecognised status id.
    type Error = StatusId;

    fn try_from(row: UserSession) -> Result<Self, Self::Error> {
        let status = SessionStatus::try_from(row.status_id)?;
        Ok(SessionRecord {
            id: row.id,
            account_id: row.user_id,
            device: DeviceDetails {
                device_id: row.device_id,
                device_token: row.device_token,
            },
            status,
            last_recent_activity: row.last_recent_activity,
        })
    }
}
