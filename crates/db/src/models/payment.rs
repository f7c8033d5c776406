//! Payment ledger model and DTOs.

use linkup_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payments` table. Immutable once inserted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    /// `None` when no user matched the payer email.
    pub user_id: Option<DbId>,
    pub transaction_id: String,
    pub payer_email: String,
    pub payer_name: Option<String>,
    pub plan_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    /// Status string exactly as the provider sent it.
    pub provider_status: String,
    #[serde(skip_serializing)]
    pub raw_payload: serde_json::Value,
    pub paid_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for inserting a payment.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub user_id: Option<DbId>,
    pub transaction_id: String,
    pub payer_email: String,
    pub payer_name: Option<String>,
    pub plan_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub provider_status: String,
    pub raw_payload: serde_json::Value,
}
