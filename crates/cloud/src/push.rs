//! Device push notifications.
//!
//! [`FcmPushSender`] posts to the Firebase Cloud Messaging HTTP endpoint with
//! a server key.

use async_trait::async_trait;
use serde::Serialize;

use crate::REQUEST_TIMEOUT;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push service returned HTTP {0}")]
    HttpStatus(u16),

    /// No push service is configured.
    #[error("Push delivery is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// PushMessage / PushSender
// ---------------------------------------------------------------------------

/// One notification addressed to a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub device_token: String,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

// ---------------------------------------------------------------------------
// FcmConfig
// ---------------------------------------------------------------------------

const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub server_key: String,
    pub endpoint: String,
}

impl FcmConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `FCM_SERVER_KEY` is not set.
    ///
    /// | Variable         | Required | Default                                |
    /// |------------------|----------|----------------------------------------|
    /// | `FCM_SERVER_KEY` | yes      | --                                      |
    /// | `FCM_ENDPOINT`   | no       | `https://fcm.googleapis.com/fcm/send`  |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            server_key: std::env::var("FCM_SERVER_KEY").ok()?,
            endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_FCM_ENDPOINT.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// FcmPushSender
// ---------------------------------------------------------------------------

pub struct FcmPushSender {
    client: reqwest::Client,
    config: FcmConfig,
}

impl FcmPushSender {
    pub fn new(config: FcmConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }
}

/// FCM request body for a single-device notification.
fn fcm_payload(message: &PushMessage) -> serde_json::Value {
    let mut notification = serde_json::json!({
        "title": message.title,
        "body": message.body,
    });
    if let Some(image) = &message.image_url {
        notification["image"] = serde_json::Value::String(image.clone());
    }
    serde_json::json!({
        "to": message.device_token,
        "notification": notification,
    })
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("key={}", self.config.server_key),
            )
            .json(&fcm_payload(message))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }
        tracing::info!(title = %message.title, "Push notification sent");
        Ok(())
    }
}
