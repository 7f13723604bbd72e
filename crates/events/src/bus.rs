//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use onboard_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A device was admitted by a password login.
pub const USER_LOGGED_IN: &str = "user.logged_in";
/// A sign-up completed mobile verification.
pub const USER_SIGNED_UP: &str = "user.signed_up";
/// A device session was closed by the user.
pub const USER_LOGGED_OUT: &str = "user.logged_out";

// ---------------------------------------------------------------------------
// AccountEvent
// ---------------------------------------------------------------------------

/// Something that happened to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEvent {
    /// Dot-separated event name, e.g. `"user.logged_in"`.
    pub event_type: String,

    /// The account the event concerns.
    pub account_id: DbId,

    /// Device session involved, when there is one.
    pub session_id: Option<DbId>,

    /// Human-readable text for the account holder.
    pub message: String,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl AccountEvent {
    pub fn new(event_type: impl Into<String>, account_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            account_id,
            session_id: None,
            message: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_session(mut self, session_id: DbId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest un-consumed events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<AccountEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it; `0` means the event
    /// was dropped.
    pub fn publish(&self, event: AccountEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let delivered = bus.publish(
            AccountEvent::new(USER_LOGGED_IN, 7)
                .with_session(42)
                .with_message("hello"),
        );
        assert_eq!(delivered, 1);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, USER_LOGGED_IN);
        assert_eq!(received.account_id, 7);
        assert_eq!(received.session_id, Some(42));
        assert_eq!(received.message, "hello");
    }

    #[test]
    fn publish_with_no_subscribers_reports_zero() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(AccountEvent::new(USER_SIGNED_UP, 1)), 0);
    }
}
