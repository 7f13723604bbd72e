//! Notification status values and the fixed messages sent on sign-in events.

/// Notification has been pushed to the receiver's device.
pub const STATUS_SENT: &str = "SENT";

/// Notification has been opened by the receiver.
pub const STATUS_READ: &str = "READ";

/// Message dispatched after a device is admitted by a password login.
pub const LOGIN_MESSAGE: &str = "You have successfully logged in!";

/// Message dispatched after a mobile number is verified at signup.
pub const SIGNUP_MESSAGE: &str = "Congratulations! You have successfully signed up.";
