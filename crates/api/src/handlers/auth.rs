//! Handlers for account onboarding and sign-in under `/user`.
//!
//! Signup, OTP verification, password login, password recovery and logout.
//! Device admission itself is delegated to [`SessionAdmission`]; these
//! handlers only settle the preconditions (account located, credential
//! verified) and translate the outcome into HTTP.
//!
//! [`SessionAdmission`]: onboard_core::admission::SessionAdmission

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use onboard_core::admission::{AdmissionOutcome, DeviceDetails};
use onboard_core::error::CoreError;
use onboard_core::status::AccountStatus;
use onboard_core::types::DbId;
use onboard_core::validation::{
    check_password_confirmation, e164, validate_country_code, validate_mobile, validate_name,
    validate_password,
};
use onboard_db::models::user::{CreateUser, User, UserResponse};
use onboard_db::repositories::{SessionRepo, UserRepo};
use onboard_events::bus::USER_LOGGED_OUT;
use onboard_events::AccountEvent;
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{AdmissionData, AdmissionResponse, DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Device descriptor passed as `?deviceId=..&deviceToken=..`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    pub device_id: Option<String>,
    pub device_token: Option<String>,
}

impl DeviceQuery {
    fn into_details(self) -> DeviceDetails {
        DeviceDetails::normalized(self.device_id, self.device_token)
    }
}

/// Request body for `POST /user/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(custom(function = "validate_country_code"))]
    pub country_code: String,
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Request body for `POST /user/verify-otp`.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(custom(function = "validate_country_code"))]
    pub country_code: String,
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
    #[validate(length(min = 4, max = 10, message = "OTP must be 4 to 10 characters"))]
    pub otp: String,
}

/// Request body for `POST /user/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for `POST /user/forgot-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

/// Request body for `POST /user/reset-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub id: DbId,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
    pub confirm_password: String,
}

/// Request body for `POST /user/change-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
    pub confirm_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/user/signup
///
/// Register an account and text a verification code to its mobile number.
/// The account stays INACTIVE and holds no session until the code is
/// verified. New accounts are never primary holders.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;

    let email = input.email.trim().to_lowercase();
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "This email already exists".into(),
        )));
    }
    if UserRepo::mobile_exists(&state.pool, &input.mobile).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "This mobile number already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    state
        .providers
        .sms
        .start_verification(&e164(&input.country_code, &input.mobile))
        .await?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: input.name.trim().to_string(),
            email,
            country_code: input.country_code,
            mobile: input.mobile,
            password_hash,
            is_primary_account_holder: false,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Account registered, verification code sent");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(
            "OTP send successfully!",
            UserResponse::from(&user),
        )),
    ))
}

/// POST /api/v1/user/verify-otp?deviceId=..&deviceToken=..
///
/// Check the texted code. On success the account becomes ACTIVE and the
/// device goes through the same admission as a password login.
pub async fn verify_otp(
    State(state): State<AppState>,
    Query(device): Query<DeviceQuery>,
    Json(input): Json<VerifyOtpRequest>,
) -> AppResult<(StatusCode, Json<AdmissionResponse>)> {
    input.validate()?;

    let user = UserRepo::find_by_mobile(&state.pool, &input.country_code, &input.mobile)
        .await?
        .ok_or_else(|| AppError::NotFound("This user does not exist".into()))?;

    let approved = state
        .providers
        .sms
        .check_verification(&e164(&user.country_code, &user.mobile), &input.otp)
        .await?;
    if !approved {
        return Err(AppError::BadRequest("Invalid OTP".into()));
    }

    let user = UserRepo::mark_otp_verified(&state.pool, user.id, &input.otp)
        .await?
        .ok_or_else(|| AppError::NotFound("This user does not exist".into()))?;

    let outcome = state
        .admission
        .admit_verified_signup(&user.snapshot(), &device.into_details())
        .await?;

    Ok(admission_response(outcome, "OTP verified successfully!"))
}

/// POST /api/v1/user/login?deviceId=..&deviceToken=..
///
/// Verify email and password, then ask the admission controller for a
/// device slot. Only an admitted device receives a token.
pub async fn login(
    State(state): State<AppState>,
    Query(device): Query<DeviceQuery>,
    Json(input): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<AdmissionResponse>)> {
    input.validate()?;

    // 1. Locate the account.
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| {
            AppError::NotFound(
                "This email does not exist. Please enter the registered email".into(),
            )
        })?;

    // 2. Verify the password.
    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Incorrect password".into(),
        )));
    }

    // 3. Reject accounts that may not sign in at all.
    let status = user.status();
    if status.is_some_and(|s| !s.can_sign_in()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "This account is blocked or deleted".into(),
        )));
    }

    // 4. Admission.
    let outcome = state
        .admission
        .admit_login(&user.snapshot(), &device.into_details())
        .await?;

    if matches!(outcome, AdmissionOutcome::Admitted { .. })
        && status == Some(AccountStatus::Logout)
    {
        UserRepo::set_status(&state.pool, user.id, AccountStatus::Active).await?;
    }

    let message = outcome.message();
    Ok(admission_response(outcome, message))
}

/// POST /api/v1/user/forgot-password
///
/// Mail password-reset instructions. `data` carries the account id the
/// client later submits to `reset-password`.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<DataResponse<DbId>>> {
    input.validate()?;

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| AppError::BadRequest("This email does not exists".into()))?;

    state
        .providers
        .mailer
        .send_password_reset(&user.email, &user.name)
        .await?;

    tracing::info!(user_id = user.id, "Password reset mail sent");

    Ok(Json(DataResponse::new("Mail sent successfully", user.id)))
}

/// POST /api/v1/user/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    input.validate()?;

    let user = UserRepo::find_by_id(&state.pool, input.id)
        .await?
        .ok_or_else(|| AppError::BadRequest("This user does not exist".into()))?;

    replace_password(&state, &user, &input.new_password, &input.confirm_password).await?;

    Ok(Json(MessageResponse::new("Password reset successfully")))
}

/// POST /api/v1/user/change-password
///
/// Same rules as `reset-password`, applied to the authenticated account.
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    input.validate()?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    replace_password(&state, &user, &input.new_password, &input.confirm_password).await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// POST /api/v1/user/logout
///
/// Deactivate the caller's device session and release its slot. The
/// account moves to LOGOUT once no ACTIVE session remains.
pub async fn logout(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<MessageResponse>> {
    if SessionRepo::deactivate(&state.pool, auth.session_id).await? {
        UserRepo::increment_login_count(&state.pool, auth.user_id, -1).await?;
    }

    if SessionRepo::count_active(&state.pool, auth.user_id).await? == 0 {
        UserRepo::set_status(&state.pool, auth.user_id, AccountStatus::Logout).await?;
    }

    state.event_bus.publish(
        AccountEvent::new(USER_LOGGED_OUT, auth.user_id).with_session(auth.session_id),
    );
    tracing::info!(user_id = auth.user_id, session_id = auth.session_id, "Device logged out");

    Ok(Json(MessageResponse::new("User logout successfully")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map an admission outcome onto the HTTP status and body clients expect.
///
/// Only an admitted device gets `200`; every other outcome is a `400` whose
/// `kind` tells the client what happened.
fn admission_response(
    outcome: AdmissionOutcome,
    admitted_message: &str,
) -> (StatusCode, Json<AdmissionResponse>) {
    let kind = outcome.kind();
    let outcome_message = outcome.message();
    let (status, message, data) = match outcome {
        AdmissionOutcome::Admitted { session_id, token } => (
            StatusCode::OK,
            admitted_message.to_string(),
            Some(AdmissionData {
                session_id,
                token: Some(token),
            }),
        ),
        AdmissionOutcome::PrimaryEvicted { session_id }
        | AdmissionOutcome::IdleEvicted { session_id } => (
            StatusCode::BAD_REQUEST,
            outcome_message.to_string(),
            Some(AdmissionData {
                session_id,
                token: None,
            }),
        ),
        AdmissionOutcome::AllBusy => (StatusCode::BAD_REQUEST, outcome_message.to_string(), None),
    };

    (
        status,
        Json(AdmissionResponse {
            kind,
            message,
            data,
        }),
    )
}

/// Validate and store a new password for `user`.
async fn replace_password(
    state: &AppState,
    user: &User,
    new_password: &str,
    confirm_password: &str,
) -> AppResult<()> {
    check_password_confirmation(new_password, confirm_password)?;

    let unchanged = verify_password(new_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if unchanged {
        return Err(AppError::BadRequest(
            "New password can not be same as of old password".into(),
        ));
    }

    let new_hash = hash_password(new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;

    tracing::info!(user_id = user.id, "Password updated");
    Ok(())
}
