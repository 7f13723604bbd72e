//! Repository for the `users` table.

use onboard_core::status::AccountStatus;
use onboard_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, country_code, mobile, password_hash, otp, \
                       is_otp_verified, status_id, login_count, is_primary_account_holder, \
                       profile_image_key, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user in INACTIVE status, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, country_code, mobile, password_hash,
                                is_primary_account_holder, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.country_code)
            .bind(&input.mobile)
            .bind(&input.password_hash)
            .bind(input.is_primary_account_holder)
            .bind(AccountStatus::Inactive.id())
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by country code and mobile number.
    pub async fn find_by_mobile(
        pool: &PgPool,
        country_code: &str,
        mobile: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM users WHERE country_code = $1 AND mobile = $2");
        sqlx::query_as::<_, User>(&query)
            .bind(country_code)
            .bind(mobile)
            .fetch_optional(pool)
            .await
    }

    /// Whether any account already holds `mobile`, whatever its country code.
    ///
    /// Mirrors the `UNIQUE (mobile)` constraint on the table.
    pub async fn mobile_exists(pool: &PgPool, mobile: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE mobile = $1)")
            .bind(mobile)
            .fetch_one(pool)
            .await
    }

    /// Record a verified OTP and activate the account.
    pub async fn mark_otp_verified(
        pool: &PgPool,
        id: DbId,
        otp: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET otp = $2, is_otp_verified = true, status_id = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(otp)
            .bind(AccountStatus::Active.id())
            .fetch_optional(pool)
            .await
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the account status. Returns `true` if the row was updated.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: AccountStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET status_id = $2 WHERE id = $1")
            .bind(id)
            .bind(status.id())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store the object-storage key of the profile image.
    pub async fn set_profile_image(
        pool: &PgPool,
        id: DbId,
        key: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET profile_image_key = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Take one login slot if `login_count < limit`.
    ///
    /// The check and the increment are a single statement, so concurrent
    /// callers can never push the counter past `limit`. Returns `None` when
    /// the account is already at the limit or does not exist.
    pub async fn try_reserve_slot(
        pool: &PgPool,
        id: DbId,
        limit: i32,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET login_count = login_count + 1
             WHERE id = $1 AND login_count < $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(limit)
            .fetch_optional(pool)
            .await
    }

    /// Add `delta` to `login_count`, flooring the result at zero.
    pub async fn increment_login_count(
        pool: &PgPool,
        id: DbId,
        delta: i32,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET login_count = GREATEST(login_count + $2, 0)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(delta)
            .fetch_optional(pool)
            .await
    }
}
