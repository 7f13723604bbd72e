//! Login and sign-up notifications.
//!
//! [`NotificationDispatcher`] turns admission notifications into
//! [`AccountEvent`]s on the [`EventBus`]. [`NotificationConsumer`] is the
//! long-lived task on the other side of the bus.

use std::sync::Arc;

use async_trait::async_trait;
use onboard_core::admission::{LoginNotifier, NotifyError};
use onboard_core::types::DbId;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::{AccountEvent, EventBus, USER_LOGGED_IN, USER_SIGNED_UP};

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

/// Publishes login and sign-up notifications onto the event bus.
#[derive(Clone)]
pub struct NotificationDispatcher {
    bus: Arc<EventBus>,
}

impl NotificationDispatcher {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    fn dispatch(&self, event: AccountEvent) -> Result<(), NotifyError> {
        let event_type = event.event_type.clone();
        match self.bus.publish(event) {
            0 => Err(NotifyError(format!(
                "no consumer subscribed for {event_type}"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl LoginNotifier for NotificationDispatcher {
    async fn notify_login(&self, account_id: DbId, message: &str) -> Result<(), NotifyError> {
        self.dispatch(AccountEvent::new(USER_LOGGED_IN, account_id).with_message(message))
    }

    async fn notify_signup(&self, account_id: DbId, message: &str) -> Result<(), NotifyError> {
        self.dispatch(AccountEvent::new(USER_SIGNED_UP, account_id).with_message(message))
    }
}

// ---------------------------------------------------------------------------
// NotificationConsumer
// ---------------------------------------------------------------------------

/// Background task that drains account events.
pub struct NotificationConsumer;

impl NotificationConsumer {
    /// Consume events until the bus closes or `cancel` fires.
    pub async fn run(mut receiver: broadcast::Receiver<AccountEvent>, cancel: CancellationToken) {
        tracing::info!("Waiting for account notifications");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification consumer cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => Self::handle(&event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notification consumer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, notification consumer shutting down");
                        break;
                    }
                },
            }
        }
    }

    fn handle(event: &AccountEvent) {
        tracing::info!(
            event_type = %event.event_type,
            account_id = event.account_id,
            session_id = ?event.session_id,
            message = %event.message,
            "Received account notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use onboard_core::notification::{LOGIN_MESSAGE, SIGNUP_MESSAGE};

    use super::*;

    #[tokio::test]
    async fn login_and_signup_publish_typed_events() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let dispatcher = NotificationDispatcher::new(Arc::clone(&bus));

        dispatcher.notify_login(3, LOGIN_MESSAGE).await.unwrap();
        dispatcher.notify_signup(4, SIGNUP_MESSAGE).await.unwrap();

        let login = rx.recv().await.unwrap();
        assert_eq!(login.event_type, USER_LOGGED_IN);
        assert_eq!(login.account_id, 3);
        assert_eq!(login.message, LOGIN_MESSAGE);

        let signup = rx.recv().await.unwrap();
        assert_eq!(signup.event_type, USER_SIGNED_UP);
        assert_eq!(signup.account_id, 4);
    }

    #[tokio::test]
    async fn missing_consumer_is_reported() {
        let dispatcher = NotificationDispatcher::new(Arc::new(EventBus::default()));
        let err = dispatcher.notify_login(1, LOGIN_MESSAGE).await.unwrap_err();
        assert!(err.0.contains(USER_LOGGED_IN));
    }

    #[tokio::test]
    async fn consumer_stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(NotificationConsumer::run(bus.subscribe(), cancel.clone()));

        bus.publish(AccountEvent::new(USER_LOGGED_IN, 1));
        cancel.cancel();

        task.await.unwrap();
    }
}
