//! Mobile number verification by SMS one-time code.
//!
//! [`TwilioVerify`] talks to the Twilio Verify v2 REST API: one call starts a
//! verification (the provider texts the code), a second checks the code the
//! user typed.

use async_trait::async_trait;
use serde::Deserialize;

use crate::REQUEST_TIMEOUT;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("SMS provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status code.
    #[error("SMS provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// No SMS provider is configured.
    #[error("SMS verification is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// SmsVerifier
// ---------------------------------------------------------------------------

/// Sends and checks one-time codes for an E.164 phone number.
#[async_trait]
pub trait SmsVerifier: Send + Sync {
    /// Text a fresh code to `to`.
    async fn start_verification(&self, to: &str) -> Result<(), SmsError>;

    /// Whether `code` is the valid, unexpired code for `to`.
    async fn check_verification(&self, to: &str, code: &str) -> Result<bool, SmsError>;
}

// ---------------------------------------------------------------------------
// TwilioConfig
// ---------------------------------------------------------------------------

const DEFAULT_TWILIO_BASE_URL: &str = "https://verify.twilio.com/v2";

/// Credentials of a Twilio Verify service.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// The `VA…` id of the Verify service.
    pub service_sid: String,
    /// API root, overridable for testing.
    pub base_url: String,
}

impl TwilioConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless all three credentials are set.
    ///
    /// | Variable                    | Required | Default                          |
    /// |-----------------------------|----------|----------------------------------|
    /// | `TWILIO_ACCOUNT_SID`        | yes      | --                                |
    /// | `TWILIO_AUTH_TOKEN`         | yes      | --                                |
    /// | `TWILIO_VERIFY_SERVICE_SID` | yes      | --                                |
    /// | `TWILIO_BASE_URL`           | no       | `https://verify.twilio.com/v2`   |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok()?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok()?,
            service_sid: std::env::var("TWILIO_VERIFY_SERVICE_SID").ok()?,
            base_url: std::env::var("TWILIO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_TWILIO_BASE_URL.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// TwilioVerify
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VerificationCheck {
    status: String,
}

/// [`SmsVerifier`] backed by Twilio Verify.
pub struct TwilioVerify {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioVerify {
    pub fn new(config: TwilioConfig) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, resource: &str) -> String {
        format!(
            "{}/Services/{}/{resource}",
            self.config.base_url.trim_end_matches('/'),
            self.config.service_sid
        )
    }

    async fn post(
        &self,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, SmsError> {
        let response = self
            .client
            .post(self.url(resource))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::HttpStatus { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl SmsVerifier for TwilioVerify {
    async fn start_verification(&self, to: &str) -> Result<(), SmsError> {
        self.post("Verifications", &[("To", to), ("Channel", "sms")])
            .await?;
        tracing::info!(to, "SMS verification started");
        Ok(())
    }

    async fn check_verification(&self, to: &str, code: &str) -> Result<bool, SmsError> {
        let response = match self
            .post("VerificationCheck", &[("To", to), ("Code", code)])
            .await
        {
            Ok(response) => response,
            // Twilio answers 404 once a verification expired or was used.
            Err(SmsError::HttpStatus { status: 404, .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        let check: VerificationCheck = response.json().await?;
        let approved = check.status == "approved";
        tracing::debug!(to, status = %check.status, "SMS verification checked");
        Ok(approved)
    }
}
