//! Current-subscription projection.

use linkup_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

pub const PLAN_STATUS_ACTIVE: &str = "active";

/// A row from the `user_plans` table. One per user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserPlan {
    pub id: DbId,
    pub user_id: DbId,
    pub plan_id: String,
    pub transaction_id: String,
    pub activated_at: Timestamp,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for activating a plan.
#[derive(Debug, Clone)]
pub struct ActivatePlan {
    pub user_id: DbId,
    pub plan_id: String,
    pub transaction_id: String,
}
