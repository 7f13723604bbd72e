//! Repository for the `notifications` table.

use onboard_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, title, description, image_url, status, sender_id, sender_name, \
                       receiver_id, receiver_name, created_at, updated_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications
                (title, description, image_url, status, sender_id, sender_name,
                 receiver_id, receiver_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image_url)
            .bind(&input.status)
            .bind(input.sender_id)
            .bind(&input.sender_name)
            .bind(input.receiver_id)
            .bind(&input.receiver_name)
            .fetch_one(pool)
            .await
    }

    /// Find one notification addressed to `receiver_id`.
    pub async fn find_for_receiver(
        pool: &PgPool,
        id: DbId,
        receiver_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM notifications WHERE id = $1 AND receiver_id = $2");
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(receiver_id)
            .fetch_optional(pool)
            .await
    }

    /// List notifications received by a user, newest first.
    pub async fn list_for_receiver(
        pool: &PgPool,
        receiver_id: DbId,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE receiver_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(receiver_id)
            .fetch_all(pool)
            .await
    }
}
