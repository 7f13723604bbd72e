//! In-process slot store.
//!
//! [`MemorySlotStore`] keeps accounts and sessions behind one
//! `tokio::sync::Mutex`, so the counter updates are atomic with respect to
//! each other. Sessions are returned in insertion order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::store::{AccountStore, SessionStore};
use super::types::{AccountSnapshot, DeviceDetails, SessionRecord, StoreError};
use crate::status::SessionStatus;
use crate::types::DbId;

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<DbId, AccountSnapshot>,
    sessions: Vec<SessionRecord>,
    next_session_id: DbId,
}

/// Account and session store held in memory.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    state: Mutex<State>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account.
    pub async fn put_account(&self, account: AccountSnapshot) {
        self.state.lock().await.accounts.insert(account.id, account);
    }

    /// Append a pre-built session row, keeping its id.
    pub async fn put_session(&self, session: SessionRecord) {
        let mut state = self.state.lock().await;
        state.next_session_id = state.next_session_id.max(session.id);
        state.sessions.push(session);
    }

    /// Current snapshot of an account, if present.
    pub async fn account(&self, account_id: DbId) -> Option<AccountSnapshot> {
        self.state.lock().await.accounts.get(&account_id).cloned()
    }

    /// Every session of an account in insertion order.
    pub async fn sessions(&self, account_id: DbId) -> Vec<SessionRecord> {
        self.state
            .lock()
            .await
            .sessions
            .iter()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect()
    }
}

fn account_not_found(id: DbId) -> StoreError {
    StoreError::NotFound {
        entity: "Account",
        id,
    }
}

#[async_trait]
impl SessionStore for MemorySlotStore {
    async fn create_session(
        &self,
        account_id: DbId,
        device: &DeviceDetails,
    ) -> Result<SessionRecord, StoreError> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&account_id) {
            return Err(account_not_found(account_id));
        }
        state.next_session_id += 1;
        let session = SessionRecord {
            id: state.next_session_id,
            account_id,
            device: device.clone(),
            status: SessionStatus::Active,
            last_recent_activity: Utc::now(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_sessions_by_account(
        &self,
        account_id: DbId,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.sessions(account_id).await)
    }

    async fn find_sessions_by_account_and_status(
        &self,
        account_id: DbId,
        status: SessionStatus,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let mut sessions = self.sessions(account_id).await;
        sessions.retain(|s| s.status == status);
        Ok(sessions)
    }

    async fn update_session_status(
        &self,
        session_id: DbId,
        status: SessionStatus,
    ) -> Result<SessionRecord, StoreError> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(StoreError::NotFound {
                entity: "Session",
                id: session_id,
            })?;
        session.status = status;
        Ok(session.clone())
    }
}

#[async_trait]
impl AccountStore for MemorySlotStore {
    async fn find_account(&self, account_id: DbId) -> Result<Option<AccountSnapshot>, StoreError> {
        Ok(self.account(account_id).await)
    }

    async fn increment_login_count(
        &self,
        account_id: DbId,
        delta: i32,
    ) -> Result<AccountSnapshot, StoreError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| account_not_found(account_id))?;
        account.login_count = (account.login_count + delta).max(0);
        Ok(account.clone())
    }

    async fn try_reserve_slot(
        &self,
        account_id: DbId,
        limit: i32,
    ) -> Result<Option<AccountSnapshot>, StoreError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| account_not_found(account_id))?;
        if account.login_count >= limit {
            return Ok(None);
        }
        account.login_count += 1;
        Ok(Some(account.clone()))
    }
}
