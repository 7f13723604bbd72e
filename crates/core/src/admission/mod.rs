//! Login-slot admission.
//!
//! Every account may hold at most [`DEFAULT_SESSION_LIMIT`] concurrent device
//! sessions, tracked by the account's `login_count`. A login at the limit
//! never creates a session: a primary account holder evicts its first session,
//! a secondary holder evicts the longest-idle INACTIVE session, and otherwise
//! the login is rejected as all-busy.
//!
//! Storage, token minting and notification delivery are injected through the
//! traits in [`store`]; [`memory::MemorySlotStore`] backs the unit tests.

pub mod controller;
pub mod memory;
pub mod policy;
pub mod store;
pub mod types;

pub use controller::SessionAdmission;
pub use policy::{decide, pick_idle, AdmissionPlan};
pub use store::{AccountStore, LoginNotifier, SessionStore, TokenIssuer};
pub use types::{
    AccountSnapshot, AdmissionError, AdmissionOutcome, DeviceDetails, IssueError, NotifyError,
    SessionRecord, StoreError, TokenClaims,
};

/// Concurrent device sessions allowed per account.
pub const DEFAULT_SESSION_LIMIT: i32 = 3;
