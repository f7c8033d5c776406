//! Interest catalog model.

use linkup_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `interests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Interest {
    pub id: DbId,
    pub name: String,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
