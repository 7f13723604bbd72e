//! Pure decision functions of the admission controller.
//!
//! Nothing here touches a store; [`decide`] picks the branch from an account
//! snapshot and [`pick_idle`] applies the eviction tie-break to the
//! candidates a store returned.

use super::types::{AccountSnapshot, SessionRecord};

/// Which of the three login branches applies to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionPlan {
    /// A slot is free: create a session and issue a token.
    CreateSession,
    /// At the limit as primary account holder: deactivate the first session.
    EvictFirstSession,
    /// At the limit as a secondary holder: free the longest-idle slot.
    EvictIdleSession,
}

/// Choose the branch for `account` under a concurrent-session `limit`.
///
/// A count above the limit (left behind when the limit is lowered) is
/// treated as being at the limit, so the account drains back down through
/// evictions instead of failing every slot reservation.
pub fn decide(account: &AccountSnapshot, limit: i32) -> AdmissionPlan {
    if account.login_count < limit {
        AdmissionPlan::CreateSession
    } else if account.is_primary_account_holder {
        AdmissionPlan::EvictFirstSession
    } else {
        AdmissionPlan::EvictIdleSession
    }
}

/// Pick the session to evict among INACTIVE `candidates` in store order.
///
/// Only the first two candidates are compared; the one with the older
/// `last_recent_activity` wins, the first one on a tie. A single candidate is
/// returned as is. Returns `None` when there are no candidates.
pub fn pick_idle(candidates: &[SessionRecord]) -> Option<&SessionRecord> {
    match candidates {
        [] => None,
        [only] => Some(only),
        [first, second, ..] => {
            if second.last_recent_activity < first.last_recent_activity {
                Some(second)
            } else {
                Some(first)
            }
        }
    }
}
