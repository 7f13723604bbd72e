//! The session admission controller.
//!
//! [`SessionAdmission::admit_login`] runs after the password check. It either
//! opens a new device session, evicts one existing session, or rejects the
//! login when every slot is busy. See [`policy`](super::policy) for the
//! branch selection and the idle tie-break.

use std::sync::Arc;

use super::policy::{decide, pick_idle, AdmissionPlan};
use super::store::{AccountStore, LoginNotifier, SessionStore, TokenIssuer};
use super::types::{
    AccountSnapshot, AdmissionError, AdmissionOutcome, DeviceDetails, StoreError, TokenClaims,
};
use super::DEFAULT_SESSION_LIMIT;
use crate::notification::{LOGIN_MESSAGE, SIGNUP_MESSAGE};
use crate::status::SessionStatus;
use crate::types::DbId;

/// How many times a lost slot reservation is re-evaluated before giving up.
const MAX_RESERVE_ATTEMPTS: usize = 3;

/// Which notification follows a successful admission.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Login,
    Signup,
}

/// Applies the login-slot policy through the store traits.
#[derive(Clone)]
pub struct SessionAdmission {
    sessions: Arc<dyn SessionStore>,
    accounts: Arc<dyn AccountStore>,
    issuer: Arc<dyn TokenIssuer>,
    notifier: Arc<dyn LoginNotifier>,
    limit: i32,
}

impl SessionAdmission {
    /// Build a controller with the default limit of
    /// [`DEFAULT_SESSION_LIMIT`] concurrent sessions.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountStore>,
        issuer: Arc<dyn TokenIssuer>,
        notifier: Arc<dyn LoginNotifier>,
    ) -> Self {
        Self {
            sessions,
            accounts,
            issuer,
            notifier,
            limit: DEFAULT_SESSION_LIMIT,
        }
    }

    /// Override the concurrent-session limit.
    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Decide the outcome of a password login for `account` and apply it.
    ///
    /// `account` must already be located and its password verified. The call
    /// is not idempotent: every admitted call holds one more slot.
    pub async fn admit_login(
        &self,
        account: &AccountSnapshot,
        device: &DeviceDetails,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        self.admit(account, device, Trigger::Login).await
    }

    /// Same policy as [`admit_login`](Self::admit_login), used when a
    /// signup's mobile number has just been verified.
    pub async fn admit_verified_signup(
        &self,
        account: &AccountSnapshot,
        device: &DeviceDetails,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        self.admit(account, device, Trigger::Signup).await
    }

    async fn admit(
        &self,
        account: &AccountSnapshot,
        device: &DeviceDetails,
        trigger: Trigger,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        let mut current = account.clone();

        for _ in 0..MAX_RESERVE_ATTEMPTS {
            match decide(&current, self.limit) {
                AdmissionPlan::CreateSession => {
                    match self.accounts.try_reserve_slot(current.id, self.limit).await? {
                        Some(reserved) => {
                            return self.open_session(&reserved, device, trigger).await;
                        }
                        None => {
                            // Another login took the last slot; re-read and re-decide.
                            tracing::debug!(account_id = current.id, "Slot reservation lost");
                            current = self
                                .accounts
                                .find_account(current.id)
                                .await?
                                .ok_or(StoreError::NotFound {
                                    entity: "Account",
                                    id: current.id,
                                })?;
                        }
                    }
                }
                AdmissionPlan::EvictFirstSession => return self.evict_first_session(&current).await,
                AdmissionPlan::EvictIdleSession => return self.evict_idle_session(&current).await,
            }
        }

        tracing::warn!(
            account_id = account.id,
            attempts = MAX_RESERVE_ATTEMPTS,
            "Gave up reserving a login slot under contention"
        );
        Ok(AdmissionOutcome::AllBusy)
    }

    /// Branch 1: the slot is already reserved; create the session and token.
    async fn open_session(
        &self,
        account: &AccountSnapshot,
        device: &DeviceDetails,
        trigger: Trigger,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        let session = match self.sessions.create_session(account.id, device).await {
            Ok(session) => session,
            Err(e) => {
                self.release_slot(account.id).await;
                return Err(e.into());
            }
        };

        let claims = TokenClaims {
            name: account.name.clone(),
            email: account.email.clone(),
        };
        let token = match self.issuer.issue(session.id, account.id, &claims).await {
            Ok(token) => token,
            Err(e) => {
                if let Err(err) = self
                    .sessions
                    .update_session_status(session.id, SessionStatus::Inactive)
                    .await
                {
                    tracing::error!(
                        session_id = session.id,
                        error = %err,
                        "Failed to roll back session"
                    );
                }
                self.release_slot(account.id).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            account_id = account.id,
            session_id = session.id,
            login_count = account.login_count,
            "Device session admitted"
        );

        let notified = match trigger {
            Trigger::Login => self.notifier.notify_login(account.id, LOGIN_MESSAGE).await,
            Trigger::Signup => self.notifier.notify_signup(account.id, SIGNUP_MESSAGE).await,
        };
        if let Err(e) = notified {
            tracing::warn!(account_id = account.id, error = %e, "Login notification failed");
        }

        Ok(AdmissionOutcome::Admitted {
            session_id: session.id,
            token,
        })
    }

    /// Branch 2: primary holder at the limit logs out the first session.
    async fn evict_first_session(
        &self,
        account: &AccountSnapshot,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        let sessions = self.sessions.find_sessions_by_account(account.id).await?;
        let Some(first) = sessions.first() else {
            tracing::warn!(
                account_id = account.id,
                "Account is at the session limit but has no session rows"
            );
            return Ok(AdmissionOutcome::AllBusy);
        };

        self.sessions
            .update_session_status(first.id, SessionStatus::Inactive)
            .await?;
        self.accounts.increment_login_count(account.id, -1).await?;

        tracing::info!(
            account_id = account.id,
            session_id = first.id,
            "Primary account holder evicted a session"
        );
        Ok(AdmissionOutcome::PrimaryEvicted {
            session_id: first.id,
        })
    }

    /// Branch 3: secondary holder at the limit frees the longest-idle slot.
    async fn evict_idle_session(
        &self,
        account: &AccountSnapshot,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        let candidates = self
            .sessions
            .find_sessions_by_account_and_status(account.id, SessionStatus::Inactive)
            .await?;
        let Some(victim) = pick_idle(&candidates) else {
            tracing::info!(account_id = account.id, "All session slots are busy");
            return Ok(AdmissionOutcome::AllBusy);
        };

        self.sessions
            .update_session_status(victim.id, SessionStatus::Inactive)
            .await?;
        self.accounts.increment_login_count(account.id, -1).await?;

        tracing::info!(
            account_id = account.id,
            session_id = victim.id,
            "Longest-idle session evicted"
        );
        Ok(AdmissionOutcome::IdleEvicted {
            session_id: victim.id,
        })
    }

    async fn release_slot(&self, account_id: DbId) {
        if let Err(e) = self.accounts.increment_login_count(account_id, -1).await {
            tracing::error!(account_id, error = %e, "Failed to release reserved slot");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::admission::memory::MemorySlotStore;
    use crate::admission::types::{IssueError, NotifyError, SessionRecord};

    #[derive(Default)]
    struct FakeIssuer {
        issued: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl TokenIssuer for FakeIssuer {
        async fn issue(
            &self,
            session_id: DbId,
            account_id: DbId,
            claims: &TokenClaims,
        ) -> Result<String, IssueError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(IssueError("signing key unavailable".into()));
            }
            self.issued.fetch_add(1, Ordering::SeqCst);
            Ok(format!("token-{account_id}-{session_id}-{}", claims.email))
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<(DbId, String)>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl LoginNotifier for FakeNotifier {
        async fn notify_login(&self, account_id: DbId, message: &str) -> Result<(), NotifyError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotifyError("queue down".into()));
            }
            self.sent.lock().unwrap().push((account_id, message.to_string()));
            Ok(())
        }

        async fn notify_signup(&self, account_id: DbId, message: &str) -> Result<(), NotifyError> {
            self.notify_login(account_id, message).await
        }
    }

    struct Harness {
        store: Arc<MemorySlotStore>,
        issuer: Arc<FakeIssuer>,
        notifier: Arc<FakeNotifier>,
        admission: SessionAdmission,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemorySlotStore::new());
        let issuer = Arc::new(FakeIssuer::default());
        let notifier = Arc::new(FakeNotifier::default());
        let admission = SessionAdmission::new(
            store.clone(),
            store.clone(),
            issuer.clone(),
            notifier.clone(),
        );
        Harness {
            store,
            issuer,
            notifier,
            admission,
        }
    }

    fn account(login_count: i32, primary: bool) -> AccountSnapshot {
        AccountSnapshot {
            id: 1,
            name: "Meera".into(),
            email: "meera@example.com".into(),
            login_count,
            is_primary_account_holder: primary,
        }
    }

    fn session(id: DbId, status: SessionStatus, idle_minutes: i64) -> SessionRecord {
        SessionRecord {
            id,
            account_id: 1,
            device: DeviceDetails::default(),
            status,
            last_recent_activity: Utc::now() - Duration::minutes(idle_minutes),
        }
    }

    fn device(id: &str) -> DeviceDetails {
        DeviceDetails {
            device_id: Some(id.into()),
            device_token: None,
        }
    }

    async fn seed(h: &Harness, account: &AccountSnapshot, sessions: Vec<SessionRecord>) {
        h.store.put_account(account.clone()).await;
        for s in sessions {
            h.store.put_session(s).await;
        }
    }

    // -- Scenario A ---------------------------------------------------------

    #[tokio::test]
    async fn first_login_is_admitted() {
        let h = harness();
        let acc = account(0, false);
        seed(&h, &acc, vec![]).await;

        let outcome = h.admission.admit_login(&acc, &device("d1")).await.unwrap();

        let session_id = assert_matches!(
            outcome,
            AdmissionOutcome::Admitted { session_id, token } => {
                assert!(token.starts_with("token-1-"));
                session_id
            }
        );
        assert_eq!(h.store.account(1).await.unwrap().login_count, 1);
        let sessions = h.store.sessions(1).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session_id);
        assert_eq!(sessions[0].status, SessionStatus::Active);
        assert_eq!(sessions[0].device.device_id.as_deref(), Some("d1"));
        assert_eq!(
            h.notifier.sent.lock().unwrap().as_slice(),
            &[(1, LOGIN_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn below_limit_adds_exactly_one_active_session() {
        for count in 0..DEFAULT_SESSION_LIMIT {
            let h = harness();
            let acc = account(count, count % 2 == 0);
            let existing = (0..count)
                .map(|i| session(100 + DbId::from(i), SessionStatus::Active, 1))
                .collect();
            seed(&h, &acc, existing).await;

            let outcome = h.admission.admit_login(&acc, &device("d")).await.unwrap();

            assert_matches!(outcome, AdmissionOutcome::Admitted { .. });
            assert_eq!(h.store.account(1).await.unwrap().login_count, count + 1);
            let active = h
                .store
                .find_sessions_by_account_and_status(1, SessionStatus::Active)
                .await
                .unwrap();
            assert_eq!(active.len() as i32, count + 1);
        }
    }

    #[tokio::test]
    async fn repeated_logins_are_not_deduplicated() {
        let h = harness();
        let acc = account(0, false);
        seed(&h, &acc, vec![]).await;

        let first = h.admission.admit_login(&acc, &device("d1")).await.unwrap();
        let second = h.admission.admit_login(&acc, &device("d1")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(h.store.sessions(1).await.len(), 2);
        assert_eq!(h.store.account(1).await.unwrap().login_count, 2);
        assert_eq!(h.issuer.issued.load(Ordering::SeqCst), 2);
    }

    // -- Scenario B ---------------------------------------------------------

    #[tokio::test]
    async fn primary_holder_at_limit_evicts_first_session() {
        let h = harness();
        let acc = account(3, true);
        seed(
            &h,
            &acc,
            vec![
                session(11, SessionStatus::Active, 50),
                session(12, SessionStatus::Active, 5),
                session(13, SessionStatus::Active, 90),
            ],
        )
        .await;

        let outcome = h.admission.admit_login(&acc, &device("d4")).await.unwrap();

        assert_eq!(outcome, AdmissionOutcome::PrimaryEvicted { session_id: 11 });
        assert_eq!(h.store.account(1).await.unwrap().login_count, 2);
        let sessions = h.store.sessions(1).await;
        assert_eq!(sessions.len(), 3, "no session is created in this branch");
        assert_eq!(sessions[0].status, SessionStatus::Inactive);
        assert_eq!(sessions[1].status, SessionStatus::Active);
        assert_eq!(sessions[2].status, SessionStatus::Active);
        assert_eq!(h.issuer.issued.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_holder_above_lowered_limit_drains_back_to_admission() {
        let h = harness();
        let acc = account(4, true);
        seed(
            &h,
            &acc,
            vec![
                session(71, SessionStatus::Active, 40),
                session(72, SessionStatus::Active, 30),
                session(73, SessionStatus::Active, 20),
                session(74, SessionStatus::Active, 10),
            ],
        )
        .await;

        let outcome = h.admission.admit_login(&acc, &device("d5")).await.unwrap();
        assert_eq!(outcome, AdmissionOutcome::PrimaryEvicted { session_id: 71 });
        assert_eq!(h.store.account(1).await.unwrap().login_count, 3);

        let acc = h.store.account(1).await.unwrap();
        let outcome = h.admission.admit_login(&acc, &device("d5")).await.unwrap();
        assert_matches!(outcome, AdmissionOutcome::PrimaryEvicted { .. });
        assert_eq!(h.store.account(1).await.unwrap().login_count, 2);

        let acc = h.store.account(1).await.unwrap();
        let outcome = h.admission.admit_login(&acc, &device("d5")).await.unwrap();
        assert_matches!(outcome, AdmissionOutcome::Admitted { .. });
        assert_eq!(h.store.account(1).await.unwrap().login_count, 3);
    }

    // -- Scenario C ---------------------------------------------------------

    #[tokio::test]
    async fn secondary_holder_at_limit_evicts_older_of_first_two_inactive() {
        let h = harness();
        let acc = account(3, false);
        seed(
            &h,
            &acc,
            vec![
                session(21, SessionStatus::Active, 1),
                session(22, SessionStatus::Inactive, 10),
                session(23, SessionStatus::Inactive, 60),
            ],
        )
        .await;

        let outcome = h.admission.admit_login(&acc, &device("d")).await.unwrap();

        // Session 23 has the older activity timestamp (t1 < t2).
        assert_eq!(outcome, AdmissionOutcome::IdleEvicted { session_id: 23 });
        assert_eq!(h.store.account(1).await.unwrap().login_count, 2);
        assert_eq!(h.store.sessions(1).await.len(), 3);
        assert_eq!(h.issuer.issued.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn idle_eviction_only_compares_first_two_candidates() {
        let h = harness();
        let acc = account(3, false);
        seed(
            &h,
            &acc,
            vec![
                session(31, SessionStatus::Inactive, 10),
                session(32, SessionStatus::Inactive, 20),
                session(33, SessionStatus::Inactive, 500),
            ],
        )
        .await;

        let outcome = h.admission.admit_login(&acc, &device("d")).await.unwrap();

        assert_eq!(outcome, AdmissionOutcome::IdleEvicted { session_id: 32 });
    }

    // -- Scenario D ---------------------------------------------------------

    #[tokio::test]
    async fn secondary_holder_with_no_inactive_sessions_is_all_busy() {
        let h = harness();
        let acc = account(3, false);
        let sessions = vec![
            session(41, SessionStatus::Active, 3),
            session(42, SessionStatus::Active, 2),
            session(43, SessionStatus::Active, 1),
        ];
        seed(&h, &acc, sessions.clone()).await;

        let outcome = h.admission.admit_login(&acc, &device("d")).await.unwrap();

        assert_eq!(outcome, AdmissionOutcome::AllBusy);
        assert_eq!(h.store.account(1).await.unwrap().login_count, 3);
        assert_eq!(h.store.sessions(1).await, sessions);
        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }

    // -- Failure handling ---------------------------------------------------

    #[tokio::test]
    async fn token_failure_rolls_back_slot_and_session() {
        let h = harness();
        h.issuer.fail.store(true, Ordering::SeqCst);
        let acc = account(1, false);
        seed(&h, &acc, vec![session(51, SessionStatus::Active, 1)]).await;

        let err = h.admission.admit_login(&acc, &device("d")).await.unwrap_err();

        assert_matches!(err, AdmissionError::TokenIssuance(_));
        assert_eq!(h.store.account(1).await.unwrap().login_count, 1);
        let active = h
            .store
            .find_sessions_by_account_and_status(1, SessionStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 51);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let h = harness();
        // Account row is missing from the store.
        let err = h
            .admission
            .admit_login(&account(0, false), &device("d"))
            .await
            .unwrap_err();

        assert_matches!(err, AdmissionError::Store(StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_login() {
        let h = harness();
        h.notifier.fail.store(true, Ordering::SeqCst);
        let acc = account(0, false);
        seed(&h, &acc, vec![]).await;

        let outcome = h.admission.admit_login(&acc, &device("d")).await.unwrap();

        assert_matches!(outcome, AdmissionOutcome::Admitted { .. });
    }

    #[tokio::test]
    async fn verified_signup_sends_signup_message() {
        let h = harness();
        let acc = account(0, false);
        seed(&h, &acc, vec![]).await;

        h.admission
            .admit_verified_signup(&acc, &DeviceDetails::default())
            .await
            .unwrap();

        assert_eq!(
            h.notifier.sent.lock().unwrap().as_slice(),
            &[(1, SIGNUP_MESSAGE.to_string())]
        );
    }

    // -- Concurrency --------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_logins_never_overshoot_the_limit() {
        let h = harness();
        let acc = account(DEFAULT_SESSION_LIMIT - 1, false);
        seed(
            &h,
            &acc,
            vec![
                session(61, SessionStatus::Active, 2),
                session(62, SessionStatus::Active, 1),
            ],
        )
        .await;

        let admission = Arc::new(h.admission.clone());
        let mut handles = Vec::new();
        for i in 0..16 {
            let admission = Arc::clone(&admission);
            let acc = acc.clone();
            handles.push(tokio::spawn(async move {
                admission
                    .admit_login(&acc, &device(&format!("d{i}")))
                    .await
                    .unwrap()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                AdmissionOutcome::Admitted { .. } => admitted += 1,
                other => assert_eq!(other, AdmissionOutcome::AllBusy),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(
            h.store.account(1).await.unwrap().login_count,
            DEFAULT_SESSION_LIMIT
        );
        assert_eq!(h.store.sessions(1).await.len(), 3);
    }

    #[tokio::test]
    async fn stale_snapshot_falls_through_to_eviction() {
        let h = harness();
        // The caller read login_count = 2 but the store already holds 3.
        let stale = account(2, true);
        seed(
            &h,
            &account(3, true),
            vec![
                session(71, SessionStatus::Active, 3),
                session(72, SessionStatus::Active, 2),
                session(73, SessionStatus::Active, 1),
            ],
        )
        .await;

        let outcome = h.admission.admit_login(&stale, &device("d")).await.unwrap();

        assert_eq!(outcome, AdmissionOutcome::PrimaryEvicted { session_id: 71 });
        assert_eq!(h.store.account(1).await.unwrap().login_count, 2);
    }
}
