//! Repository for the `user_sessions` table.

use onboard_core::status::SessionStatus;
use onboard_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::UserSession;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, device_id, device_token, status_id, \
                       last_recent_activity, created_at, updated_at";

/// Provides CRUD operations for device sessions.
///
/// Lists are ordered by ascending `id`, which is the order the admission
/// controller treats as "first".
pub struct SessionRepo;

impl SessionRepo {
    /// Insert an ACTIVE session with `last_recent_activity = NOW()`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        device_id: Option<&str>,
        device_token: Option<&str>,
    ) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, device_id, device_token, status_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .bind(device_id)
            .bind(device_token)
            .bind(SessionStatus::Active.id())
        .fetch_one(pool)
        .await
    }

    /// Find a session by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE id = $1");
        sqlx::query_as::<_, UserSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All sessions of a user.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE user_id = $1 ORDER BY id");
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Sessions of a user with the given status.
    pub async fn list_by_user_and_status(
        pool: &PgPool,
        user_id: DbId,
        status: SessionStatus,
    ) -> Result<Vec<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_id = $1 AND status_id = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .bind(status.id())
            .fetch_all(pool)
            .await
    }

    /// Set the status of one session. Returns `None` if it does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: SessionStatus,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a session if it is still ACTIVE.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE user_sessions SET status_id = $2 WHERE id = $1 AND status_id = $3")
                .bind(id)
                .bind(SessionStatus::Inactive.id())
                .bind(SessionStatus::Active.id())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Refresh `last_recent_activity` of an ACTIVE session.
    pub async fn touch(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE user_sessions SET last_recent_activity = NOW()
             WHERE id = $1 AND status_id = $2",
        )
        .bind(id)
        .bind(SessionStatus::Active.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count ACTIVE sessions of a user.
    pub async fn count_active(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_sessions WHERE user_id = $1 AND status_id = $2",
        )
        .bind(user_id)
        .bind(SessionStatus::Active.id())
            .fetch_one(pool)
            .await
    }

    /// Most recent session of a user that carries a push device token.
    pub async fn latest_with_device_token(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_id = $1 AND device_token IS NOT NULL
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
