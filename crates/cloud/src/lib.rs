//! Vendor integrations behind narrow traits.
//!
//! - [`sms`]: one-time-code verification of mobile numbers (Twilio Verify).
//! - [`push`]: device push notifications (Firebase Cloud Messaging).
//! - [`storage`]: object storage for uploaded files (S3).
//! - [`fake`]: in-memory implementations for tests and unconfigured deployments.

pub mod fake;
pub mod push;
pub mod sms;
pub mod storage;

pub use push::{FcmConfig, FcmPushSender, PushError, PushMessage, PushSender};
pub use sms::{SmsError, SmsVerifier, TwilioConfig, TwilioVerify};
pub use storage::{ObjectStore, S3ObjectStore, StorageConfig, StorageError, StoredObject};

use std::time::Duration;

/// HTTP request timeout for a single vendor call.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
