//! Raw webhook audit log model.

use linkup_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

pub const SOURCE_PAYMENT_PROVIDER: &str = "payment_provider";

/// A row from the `webhook_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookLog {
    pub id: DbId,
    pub source: String,
    pub transaction_id: Option<String>,
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
}
