use onboard_cloud::{FcmConfig, StorageConfig, TwilioConfig};
use onboard_core::admission::DEFAULT_SESSION_LIMIT;
use onboard_events::EmailConfig;

use crate::auth::jwt::JwtConfig;

/// Default upper bound on a profile-image upload.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret. Vendor integrations are `None` when their variables are unset.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Concurrent device sessions allowed per account.
    pub session_limit: i32,
    /// Largest accepted profile-image upload.
    pub max_upload_bytes: usize,
    pub jwt: JwtConfig,
    pub email: Option<EmailConfig>,
    pub sms: Option<TwilioConfig>,
    pub push: Option<FcmConfig>,
    pub storage: Option<StorageConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SESSION_LIMIT`        | `3`                        |
    /// | `MAX_UPLOAD_BYTES`     | `5242880`                  |
    ///
    /// Vendor sections are read by [`JwtConfig::from_env`],
    /// [`EmailConfig::from_env`], [`TwilioConfig::from_env`],
    /// [`FcmConfig::from_env`] and [`StorageConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let session_limit: i32 = std::env::var("SESSION_LIMIT")
            .unwrap_or_else(|_| DEFAULT_SESSION_LIMIT.to_string())
            .parse()
            .expect("SESSION_LIMIT must be a valid i32");
        assert!(session_limit > 0, "SESSION_LIMIT must be positive");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            session_limit,
            max_upload_bytes,
            jwt: JwtConfig::from_env(),
            email: EmailConfig::from_env(),
            sms: TwilioConfig::from_env(),
            push: FcmConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}
