//! Payment provider webhook parsing.
//!
//! Provider payloads are loosely shaped: every field is optional on the wire
//! and the amount may arrive as a number or a numeric string. Parsing fails
//! closed with [`CoreError::MalformedWebhook`] when the fields needed to
//! reconcile a payment are missing. Negative amounts (refunds, chargebacks)
//! are kept as sent.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Provider statuses that activate a plan.
const SUCCESS_STATUSES: &[&str] = &["success", "approved", "completed"];

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookBilling {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    pub transaction_id: Option<serde_json::Value>,
    pub status: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub currency: Option<String>,
    pub billing: Option<WebhookBilling>,
    /// Some provider integrations send the email at the top level.
    pub customer_email: Option<String>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Status stored on a payment ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Failed,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

/// Map a provider status string onto a ledger status.
///
/// Matching is case-insensitive. Anything that is neither a success status
/// nor `pending` is recorded as failed.
pub fn classify_status(raw: &str) -> PaymentStatus {
    let status = raw.trim().to_lowercase();
    if SUCCESS_STATUSES.contains(&status.as_str()) {
        PaymentStatus::Completed
    } else if status == "pending" {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Failed
    }
}

// ---------------------------------------------------------------------------
// Parsed form
// ---------------------------------------------------------------------------

/// A webhook with its required fields present and its values normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWebhook {
    pub transaction_id: String,
    pub raw_status: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    /// Trimmed, otherwise exactly as submitted. Match users case-insensitively.
    pub customer_email: String,
    pub payer_name: Option<String>,
}

impl ParsedWebhook {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        let payload: WebhookPayload = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::MalformedWebhook(format!("unexpected payload shape: {e}")))?;
        Self::from_payload(payload)
    }

    pub fn from_payload(payload: WebhookPayload) -> Result<Self, CoreError> {
        let transaction_id = payload
            .transaction_id
            .as_ref()
            .and_then(scalar_to_string)
            .ok_or_else(|| CoreError::MalformedWebhook("missing transaction_id".to_string()))?;

        let billing = payload.billing.unwrap_or_default();
        let customer_email = billing
            .email
            .as_deref()
            .or(payload.customer_email.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CoreError::MalformedWebhook("missing customer email".to_string()))?;

        let amount = match payload.amount {
            None | Some(serde_json::Value::Null) => 0.0,
            Some(ref v) => parse_amount(v)?,
        };

        let raw_status = payload.status.unwrap_or_default();
        let status = classify_status(&raw_status);

        let currency = payload
            .currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let payer_name = [billing.first_name, billing.last_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let payer_name = (!payer_name.is_empty()).then_some(payer_name);

        Ok(Self {
            transaction_id,
            raw_status,
            status,
            amount,
            currency,
            customer_email,
            payer_name,
        })
    }
}

/// Transaction ids may be sent as strings or integers.
fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    let s = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn parse_amount(value: &serde_json::Value) -> Result<f64, CoreError> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        Some(a) if a.is_finite() => Ok(a),
        _ => Err(CoreError::MalformedWebhook(format!("invalid amount: {value}"))),
    }
}
