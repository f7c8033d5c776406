//! Repository for the `referral_codes` table.

use linkup_core::types::DbId;
use sqlx::PgPool;

use crate::models::referral_code::ReferralCode;

/// Column list for `referral_codes` queries.
const COLUMNS: &str = "id, user_id, code, usage_count, is_active, created_at, updated_at";

pub struct ReferralCodeRepo;

impl ReferralCodeRepo {
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM referral_codes WHERE user_id = $1");
        sqlx::query_as::<_, ReferralCode>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Return the user's code, inserting `candidate` if they have none.
    ///
    /// Uses a no-op `DO UPDATE` so `RETURNING` yields the existing row when
    /// the user already owns a code. A collision of `candidate` with another
    /// user's code surfaces as a unique violation on `uq_referral_codes_code`.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: DbId,
        candidate: &str,
    ) -> Result<ReferralCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO referral_codes (user_id, code) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = referral_codes.user_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReferralCode>(&query)
            .bind(user_id)
            .bind(candidate)
            .fetch_one(pool)
            .await
    }

    /// Look up a code and lock it so the usage counter update is serialized.
    pub async fn find_by_code_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        code: &str,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM referral_codes WHERE code = $1 FOR UPDATE");
        sqlx::query_as::<_, ReferralCode>(&query)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn increment_usage(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE referral_codes SET usage_count = usage_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
