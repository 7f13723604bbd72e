//! Postgres implementation of the admission store traits.

use async_trait::async_trait;
use onboard_core::admission::{
    AccountSnapshot, AccountStore, DeviceDetails, SessionRecord, SessionStore, StoreError,
};
use onboard_core::status::SessionStatus;
use onboard_core::types::DbId;

use crate::models::session::UserSession;
use crate::repositories::{SessionRepo, UserRepo};
use crate::DbPool;

/// Account and session store backed by the `users` and `user_sessions`
/// tables.
#[derive(Debug, Clone)]
pub struct PgSlotStore {
    pool: DbPool,
}

impl PgSlotStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn decode(row: UserSession) -> Result<SessionRecord, StoreError> {
    let id = row.id;
    SessionRecord::try_from(row).map_err(|status_id| {
        StoreError::Backend(format!("session {id} has unknown status_id {status_id}"))
    })
}

fn decode_all(rows: Vec<UserSession>) -> Result<Vec<SessionRecord>, StoreError> {
    rows.into_iter().map(decode).collect()
}

#[async_trait]
impl SessionStore for PgSlotStore {
    async fn create_session(
        &self,
        account_id: DbId,
        device: &DeviceDetails,
    ) -> Result<SessionRecord, StoreError> {
        let row = SessionRepo::create(
            &self.pool,
            account_id,
            device.device_id.as_deref(),
            device.device_token.as_deref(),
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                StoreError::NotFound {
                    entity: "Account",
                    id: account_id,
                }
            }
            other => backend(other),
        })?;
        decode(row)
    }

    async fn find_sessions_by_account(
        &self,
        account_id: DbId,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let rows = SessionRepo::list_by_user(&self.pool, account_id)
            .await
            .map_err(backend)?;
        decode_all(rows)
    }

    async fn find_sessions_by_account_and_status(
        &self,
        account_id: DbId,
        status: SessionStatus,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let rows = SessionRepo::list_by_user_and_status(&self.pool, account_id, status)
            .await
            .map_err(backend)?;
        decode_all(rows)
    }

    async fn update_session_status(
        &self,
        session_id: DbId,
        status: SessionStatus,
    ) -> Result<SessionRecord, StoreError> {
        let row = SessionRepo::update_status(&self.pool, session_id, status)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound {
                entity: "Session",
                id: session_id,
            })?;
        decode(row)
    }
}

#[async_trait]
impl AccountStore for PgSlotStore {
    async fn find_account(&self, account_id: DbId) -> Result<Option<AccountSnapshot>, StoreError> {
        let user = UserRepo::find_by_id(&self.pool, account_id)
            .await
            .map_err(backend)?;
        Ok(user.map(|u| u.snapshot()))
    }

    async fn increment_login_count(
        &self,
        account_id: DbId,
        delta: i32,
    ) -> Result<AccountSnapshot, StoreError> {
        UserRepo::increment_login_count(&self.pool, account_id, delta)
            .await
            .map_err(backend)?
            .map(|u| u.snapshot())
            .ok_or(StoreError::NotFound {
                entity: "Account",
                id: account_id,
            })
    }

    async fn try_reserve_slot(
        &self,
        account_id: DbId,
        limit: i32,
    ) -> Result<Option<AccountSnapshot>, StoreError> {
        if let Some(user) = UserRepo::try_reserve_slot(&self.pool, account_id, limit)
            .await
            .map_err(backend)?
        {
            return Ok(Some(user.snapshot()));
        }
        // Distinguish "at the limit" from "no such account".
        match UserRepo::find_by_id(&self.pool, account_id)
            .await
            .map_err(backend)?
        {
            Some(_) => Ok(None),
            None => Err(StoreError::NotFound {
                entity: "Account",
                id: account_id,
            }),
        }
    }
}
