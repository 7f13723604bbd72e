//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the account and device session behind a Bearer token.

pub mod auth;
