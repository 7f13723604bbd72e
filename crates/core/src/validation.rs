//! Input validation helpers shared by request DTOs.
//!
//! The `validate_*` functions have the signature expected by
//! `#[validate(custom(function = "..."))]` so they can be attached to
//! `validator::Validate` derives in the API crate.

use std::borrow::Cow;

use validator::ValidationError;

use crate::error::CoreError;

/// Maximum display-name length accepted at signup, in characters.
pub const MAX_NAME_LENGTH: usize = 15;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum accepted length of a national mobile number (digits only).
const MIN_MOBILE_DIGITS: usize = 6;

/// Maximum accepted length of a national mobile number (digits only).
const MAX_MOBILE_DIGITS: usize = 14;

/// Validate a display name: not blank, at most [`MAX_NAME_LENGTH`] characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(invalid("name", "Name must be 1 to 15 characters"));
    }
    Ok(())
}

/// Validate a new password: at least [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(invalid("password", "Password must be at least 8 characters long"));
    }
    Ok(())
}

/// Validate a national mobile number: digits only, 6 to 14 of them.
pub fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    let len = mobile.len();
    if !(MIN_MOBILE_DIGITS..=MAX_MOBILE_DIGITS).contains(&len)
        || !mobile.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("mobile", "Mobile must contain 6 to 14 digits"));
    }
    Ok(())
}

/// Validate an international dialling code, with or without a leading `+`.
pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
    let digits = code.strip_prefix('+').unwrap_or(code);
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(
            "country_code",
            "Country code must be 1 to 4 digits, optionally prefixed with '+'",
        ));
    }
    Ok(())
}

/// Build the E.164 number handed to the SMS provider.
pub fn e164(country_code: &str, mobile: &str) -> String {
    let code = country_code.trim().trim_start_matches('+');
    format!("+{code}{}", mobile.trim())
}

/// Check the `new_password` / `confirm_password` pair of a reset or change.
pub fn check_password_confirmation(new_password: &str, confirm: &str) -> Result<(), CoreError> {
    if new_password != confirm {
        return Err(CoreError::Validation(
            "Confirm password does not match with new password".into(),
        ));
    }
    Ok(())
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}
