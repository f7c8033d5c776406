//! Repository for the `user_plans` projection.

use linkup_core::types::DbId;
use sqlx::PgPool;

use crate::models::user_plan::{ActivatePlan, UserPlan, PLAN_STATUS_ACTIVE};

/// Column list for `user_plans` queries.
const COLUMNS: &str = "\
    id, user_id, plan_id, transaction_id, activated_at, status, created_at, updated_at";

pub struct UserPlanRepo;

impl UserPlanRepo {
    pub async fn find_by_user(pool: &PgPool, user_id: DbId) -> Result<Option<UserPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_plans WHERE user_id = $1");
        sqlx::query_as::<_, UserPlan>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Activate a plan, overwriting whatever plan the user had before.
    pub async fn activate(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &ActivatePlan,
    ) -> Result<UserPlan, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_plans (user_id, plan_id, transaction_id, activated_at, status) \
             VALUES ($1, $2, $3, NOW(), $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 plan_id = EXCLUDED.plan_id, \
                 transaction_id = EXCLUDED.transaction_id, \
                 activated_at = EXCLUDED.activated_at, \
                 status = EXCLUDED.status \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserPlan>(&query)
            .bind(input.user_id)
            .bind(&input.plan_id)
            .bind(&input.transaction_id)
            .bind(PLAN_STATUS_ACTIVE)
            .fetch_one(&mut **tx)
            .await
    }
}
