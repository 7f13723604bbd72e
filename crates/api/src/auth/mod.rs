//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- session-bound access tokens and the admission
//!   [`TokenIssuer`](onboard_core::admission::TokenIssuer).

pub mod jwt;
pub mod password;
