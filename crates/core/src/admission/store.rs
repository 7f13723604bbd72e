//! Collaborator seams of the admission controller.

use async_trait::async_trait;

use super::types::{
    AccountSnapshot, DeviceDetails, IssueError, NotifyError, SessionRecord, StoreError,
    TokenClaims,
};
use crate::status::SessionStatus;
use crate::types::DbId;

/// Persisted device sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert an ACTIVE session with `last_recent_activity = now`.
    async fn create_session(
        &self,
        account_id: DbId,
        device: &DeviceDetails,
    ) -> Result<SessionRecord, StoreError>;

    /// All sessions of an account in the store's natural order.
    async fn find_sessions_by_account(
        &self,
        account_id: DbId,
    ) -> Result<Vec<SessionRecord>, StoreError>;

    /// Sessions of an account with the given status, in natural order.
    async fn find_sessions_by_account_and_status(
        &self,
        account_id: DbId,
        status: SessionStatus,
    ) -> Result<Vec<SessionRecord>, StoreError>;

    /// Set the status of one session, returning the updated row.
    async fn update_session_status(
        &self,
        session_id: DbId,
        status: SessionStatus,
    ) -> Result<SessionRecord, StoreError>;
}

/// Persisted accounts and their slot counter.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Load the current snapshot of an account.
    async fn find_account(&self, account_id: DbId) -> Result<Option<AccountSnapshot>, StoreError>;

    /// Add `delta` to `login_count`, flooring the result at zero.
    async fn increment_login_count(
        &self,
        account_id: DbId,
        delta: i32,
    ) -> Result<AccountSnapshot, StoreError>;

    /// Atomically take one slot if `login_count < limit`.
    ///
    /// Returns the updated snapshot, or `None` when every slot is held.
    async fn try_reserve_slot(
        &self,
        account_id: DbId,
        limit: i32,
    ) -> Result<Option<AccountSnapshot>, StoreError>;
}

/// Mints the bearer credential bound to a session.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(
        &self,
        session_id: DbId,
        account_id: DbId,
        claims: &TokenClaims,
    ) -> Result<String, IssueError>;
}

/// Best-effort signal sent after a device is admitted.
#[async_trait]
pub trait LoginNotifier: Send + Sync {
    async fn notify_login(&self, account_id: DbId, message: &str) -> Result<(), NotifyError>;

    async fn notify_signup(&self, account_id: DbId, message: &str) -> Result<(), NotifyError>;
}
