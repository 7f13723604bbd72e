//! Account event bus and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`AccountEvent`]: the event envelope for sign-ups, logins and logouts.
//! - [`NotificationDispatcher`]: the admission controller's
//!   [`LoginNotifier`](onboard_core::admission::LoginNotifier), publishing onto the bus.
//! - [`NotificationConsumer`]: background task draining the bus.
//! - [`delivery`]: external delivery channels (SMTP email).

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::{AccountEvent, EventBus};
pub use delivery::email::{
    EmailConfig, EmailDelivery, EmailError, PasswordResetMailer, UnconfiguredMailer,
};
pub use dispatcher::{NotificationConsumer, NotificationDispatcher};
