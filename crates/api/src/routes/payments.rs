//! Route definitions for payments.
//!
//! Mounted at `/payments` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// ```text
/// POST   /webhook            -> webhook
/// GET    /{transaction_id}   -> get_payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(payments::webhook))
        .route("/{transaction_id}", get(payments::get_payment))
}
