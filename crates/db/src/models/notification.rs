//! Notification entity model and DTOs.

use onboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub status: String,
    pub sender_id: DbId,
    pub sender_name: String,
    pub receiver_id: DbId,
    pub receiver_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a delivered notification.
#[derive(Debug, Deserialize)]
pub struct CreateNotification {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub status: String,
    pub sender_id: DbId,
    pub sender_name: String,
    pub receiver_id: DbId,
    pub receiver_name: String,
}
