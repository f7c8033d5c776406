//! Handlers for the payment provider webhook and ledger lookups.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkup_db::repositories::PaymentRepo;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::response::{ApiResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /payments/webhook
// ---------------------------------------------------------------------------

/// Accept a provider delivery.
///
/// Returns 200 for processed and duplicate deliveries. Failures use the
/// provider-facing `{ "success": false, "error": ... }` envelope: 400 for
/// unusable payloads, 500 for anything else so the provider retries.
pub async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    match state.payments.process(&body).await {
        Ok(outcome) => Json(MessageResponse::ok(outcome.message())).into_response(),
        Err(err) => webhook_error(err, &body),
    }
}

/// Render a reconciliation failure. This is the only log event for it; 5xx
/// failures carry the raw payload so the delivery can be replayed.
pub fn webhook_error(err: AppError, body: &[u8]) -> Response {
    let (status, _code, message) = err.classify();
    if status.is_server_error() {
        tracing::error!(
            error = ?err,
            payload = %String::from_utf8_lossy(body),
            "Payment webhook processing failed"
        );
    } else {
        tracing::warn!(error = %err, "Rejected payment webhook");
    }

    let status = if status.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

// ---------------------------------------------------------------------------
// GET /payments/{transaction_id}
// ---------------------------------------------------------------------------

/// Ledger row for a provider transaction id. 404 when unknown.
pub async fn get_payment(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let payment = PaymentRepo::find_by_transaction_id(&state.pool, &transaction_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(Json(ApiResponse::ok(payment)))
}
