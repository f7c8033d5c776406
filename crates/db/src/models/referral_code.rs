//! Referral code entity model.

use linkup_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `referral_codes` table. Each user owns at most one code.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReferralCode {
    pub id: DbId,
    pub user_id: DbId,
    pub code: String,
    pub usage_count: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
