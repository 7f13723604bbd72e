//! Object storage for uploaded files.
//!
//! [`S3ObjectStore`] writes to an S3 bucket (or any S3-compatible endpoint)
//! through `aws-sdk-s3`.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use onboard_core::types::DbId;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object upload failed: {0}")]
    Upload(String),

    /// No object storage is configured.
    #[error("Object storage is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

/// Location and size of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

/// Object key of an account's profile image.
///
/// Only the extension of `file_name` is kept; the rest of the key is derived
/// from the account id and a random component.
pub fn profile_image_key(account_id: DbId, file_name: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });
    let id = uuid::Uuid::new_v4().simple();
    match extension {
        Some(ext) => format!("profile-images/{account_id}/{id}.{ext}"),
        None => format!("profile-images/{account_id}/{id}"),
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    pub endpoint_url: Option<String>,
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `S3_BUCKET` is not set. Credentials come from the
    /// standard AWS provider chain.
    ///
    /// | Variable          | Required | Default      |
    /// |-------------------|----------|--------------|
    /// | `S3_BUCKET`       | yes      | --            |
    /// | `AWS_REGION`      | no       | `us-east-1`  |
    /// | `S3_ENDPOINT_URL` | no       | --            |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            bucket: std::env::var("S3_BUCKET").ok()?,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// S3ObjectStore
// ---------------------------------------------------------------------------

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from the AWS environment and `config`.
    pub async fn connect(config: StorageConfig) -> Self {
        let shared = aws_config::from_env()
            .region(aws_config::Region::new(config.region))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;

        tracing::info!(bucket = %self.bucket, key, size, "Object uploaded");
        Ok(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size,
        })
    }
}
