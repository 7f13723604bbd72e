//! In-memory provider implementations.
//!
//! [`Unconfigured`] stands in for a provider whose credentials are missing
//! and fails every call. The other types record what they were asked to do.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::push::{PushError, PushMessage, PushSender};
use crate::sms::{SmsError, SmsVerifier};
use crate::storage::{ObjectStore, StorageError, StoredObject};

// ---------------------------------------------------------------------------
// Unconfigured
// ---------------------------------------------------------------------------

/// Provider placeholder that rejects every call with `NotConfigured`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

#[async_trait]
impl SmsVerifier for Unconfigured {
    async fn start_verification(&self, _to: &str) -> Result<(), SmsError> {
        Err(SmsError::NotConfigured)
    }

    async fn check_verification(&self, _to: &str, _code: &str) -> Result<bool, SmsError> {
        Err(SmsError::NotConfigured)
    }
}

#[async_trait]
impl PushSender for Unconfigured {
    async fn send(&self, _message: &PushMessage) -> Result<(), PushError> {
        Err(PushError::NotConfigured)
    }
}

#[async_trait]
impl ObjectStore for Unconfigured {
    async fn put_object(
        &self,
        _key: &str,
        _body: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        Err(StorageError::NotConfigured)
    }
}

// ---------------------------------------------------------------------------
// StaticCodeVerifier
// ---------------------------------------------------------------------------

/// Accepts one fixed code for every number.
#[derive(Debug)]
pub struct StaticCodeVerifier {
    code: String,
    started: Mutex<Vec<String>>,
}

impl StaticCodeVerifier {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            started: Mutex::new(Vec::new()),
        }
    }

    /// Numbers a verification was started for, in call order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SmsVerifier for StaticCodeVerifier {
    async fn start_verification(&self, to: &str) -> Result<(), SmsError> {
        if let Ok(mut started) = self.started.lock() {
            started.push(to.to_string());
        }
        Ok(())
    }

    async fn check_verification(&self, _to: &str, code: &str) -> Result<bool, SmsError> {
        Ok(code == self.code)
    }
}

// ---------------------------------------------------------------------------
// RecordingPushSender
// ---------------------------------------------------------------------------

/// Keeps every pushed message.
#[derive(Debug, Default)]
pub struct RecordingPushSender {
    sent: Mutex<Vec<PushMessage>>,
}

impl RecordingPushSender {
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PushSender for RecordingPushSender {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryObjectStore
// ---------------------------------------------------------------------------

/// Keeps uploaded objects in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<Vec<(StoredObject, Vec<u8>)>>,
}

impl MemoryObjectStore {
    /// Body of the object stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let objects = self.objects.lock().ok()?;
        objects
            .iter()
            .find(|(meta, _)| meta.key == key)
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let stored = StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size: body.len(),
        };
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::Upload(e.to_string()))?;
        objects.push((stored.clone(), body));
        Ok(stored)
    }
}
