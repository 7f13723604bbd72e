//! Shared response envelope types for API handlers.
//!
//! Successful responses use a `{ "message": ..., "data": ... }` envelope.

use serde::Serialize;

/// Standard `{ "message": String, "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Envelope without a payload.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of every login and OTP-verification response.
///
/// `kind` names the admission outcome; `token` is set only when a device was
/// admitted.
#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub kind: &'static str,
    pub message: String,
    pub data: Option<AdmissionData>,
}

#[derive(Debug, Serialize)]
pub struct AdmissionData {
    pub session_id: onboard_core::types::DbId,
    pub token: Option<String>,
}
