//! Repository for the `users` table.
//!
//! Every lookup and update ignores soft-deleted rows. Profile setters return
//! `None` when the user does not exist.

use linkup_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list for `users` queries.
const COLUMNS: &str = "\
    id, phone_number, country_code, phone_verified_at, otp_code, otp_expires_at, \
    email, connection_type, search_radius, discovery_sources, bio, \
    referred_by_user_id, referral_code_used, onboarding_completed, \
    onboarding_completed_at, status, deleted_at, created_at, updated_at";

/// Email match used by payment reconciliation.
const BY_EMAIL: &str =
    "LOWER(email) = LOWER($1) AND deleted_at IS NULL ORDER BY id LIMIT 1";

pub struct UserRepo;

impl UserRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_phone(
        pool: &PgPool,
        phone_number: &str,
        country_code: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE phone_number = $1 AND country_code = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(phone_number)
            .bind(country_code)
            .fetch_optional(pool)
            .await
    }

    /// Find the oldest live user with this contact email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE {BY_EMAIL}");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new unverified user holding a pending OTP.
    ///
    /// Fails with a unique violation on `uq_users_phone` if a live user with
    /// the same number already exists.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (phone_number, country_code, otp_code, otp_expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.phone_number)
            .bind(&input.country_code)
            .bind(&input.otp_code)
            .bind(input.otp_expires_at)
            .fetch_one(pool)
            .await
    }

    /// Overwrite the pending OTP. Returns `false` if the user does not exist.
    pub async fn set_otp(
        pool: &PgPool,
        id: DbId,
        otp_code: &str,
        otp_expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET otp_code = $2, otp_expires_at = $3 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(otp_code)
        .bind(otp_expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark the phone verified and clear the OTP, but only if `otp_code`
    /// matches the stored code and has not expired.
    ///
    /// Check and clear happen in one statement, so two concurrent attempts
    /// with the same code cannot both succeed.
    pub async fn consume_otp(
        pool: &PgPool,
        id: DbId,
        otp_code: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users \
             SET phone_verified_at = NOW(), otp_code = NULL, otp_expires_at = NULL \
             WHERE id = $1 AND deleted_at IS NULL \
               AND otp_code = $2 AND otp_expires_at > NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(otp_code)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_connection_type(
        pool: &PgPool,
        id: DbId,
        connection_type: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        Self::set_column(pool, id, "connection_type", connection_type).await
    }

    pub async fn set_search_radius(
        pool: &PgPool,
        id: DbId,
        radius: i32,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET search_radius = $2 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(radius)
            .fetch_optional(pool)
            .await
    }

    /// Replace the discovery source list (a JSON array of tags).
    pub async fn set_discovery_sources(
        pool: &PgPool,
        id: DbId,
        sources: &serde_json::Value,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET discovery_sources = $2 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(sources)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_bio(pool: &PgPool, id: DbId, bio: &str) -> Result<Option<User>, sqlx::Error> {
        Self::set_column(pool, id, "bio", bio).await
    }

    pub async fn set_email(
        pool: &PgPool,
        id: DbId,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        Self::set_column(pool, id, "email", email).await
    }

    /// Set the completion flag. The first completion timestamp is kept on
    /// repeat calls.
    pub async fn complete_onboarding(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users \
             SET onboarding_completed = TRUE, \
                 onboarding_completed_at = COALESCE(onboarding_completed_at, NOW()) \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Transactional helpers
    // -----------------------------------------------------------------------

    /// Load a user and lock the row until the transaction ends.
    ///
    /// `NO KEY UPDATE` leaves the row open to the `KEY SHARE` lock taken by
    /// foreign-key checks, so two users referring each other do not deadlock.
    pub async fn find_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL FOR NO KEY UPDATE"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Same as [`Self::find_by_email`], inside a transaction.
    pub async fn find_by_email_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE {BY_EMAIL}");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Record which code the user signed up with and who owns it.
    pub async fn set_referrer(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        referrer_id: DbId,
        code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET referred_by_user_id = $2, referral_code_used = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(referrer_id)
        .bind(code)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Update a single text column. `column` must be a trusted identifier.
    async fn set_column(
        pool: &PgPool,
        id: DbId,
        column: &'static str,
        value: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET {column} = $2 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(value)
            .fetch_optional(pool)
            .await
    }
}
