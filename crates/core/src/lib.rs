//! Domain core of the onboarding backend.
//!
//! Holds the pieces that have no database or HTTP dependency: shared
//! types, the error taxonomy, status enums, input validation helpers, and
//! the login-slot [`admission`] controller.

pub mod admission;
pub mod error;
pub mod notification;
pub mod status;
pub mod types;
pub mod validation;
