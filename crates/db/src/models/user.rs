//! User entity model and DTOs.

use linkup_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub phone_number: String,
    pub country_code: String,
    pub phone_verified_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub otp_code: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<Timestamp>,
    pub email: Option<String>,
    pub connection_type: Option<String>,
    pub search_radius: Option<i32>,
    /// JSON array of discovery source tags.
    pub discovery_sources: serde_json::Value,
    pub bio: Option<String>,
    pub referred_by_user_id: Option<DbId>,
    pub referral_code_used: Option<String>,
    pub onboarding_completed: bool,
    pub onboarding_completed_at: Option<Timestamp>,
    pub status: String,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn is_phone_verified(&self) -> bool {
        self.phone_verified_at.is_some()
    }

    pub fn has_discovery_sources(&self) -> bool {
        self.discovery_sources
            .as_array()
            .is_some_and(|sources| !sources.is_empty())
    }
}

/// DTO for creating a user at phone-verification initiation.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub phone_number: String,
    pub country_code: String,
    pub otp_code: String,
    pub otp_expires_at: Timestamp,
}
