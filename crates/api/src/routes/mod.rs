pub mod health;
pub mod onboarding;
pub mod payments;
pub mod plans;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /onboarding/phone/initiate                 issue OTP (POST)
/// /onboarding/phone/verify                   verify OTP (POST)
/// /onboarding/connection-type                set connection type (POST)
/// /onboarding/search-radius                  set search radius (POST)
/// /onboarding/referral-code                  apply a referral code (POST)
/// /onboarding/referral-code/{user_id}        own referral code (GET)
/// /onboarding/discovery-sources              set discovery sources (POST)
/// /onboarding/interests                      catalog (GET), replace selection (POST)
/// /onboarding/introduction                   set bio (POST)
/// /onboarding/introduction-questions         question catalog (GET)
/// /onboarding/introduction-answers           save answers (POST)
/// /onboarding/email                          set contact email (POST)
/// /onboarding/complete                       mark complete (POST)
/// /onboarding/status/{user_id}               progress summary (GET)
///
/// /payments/webhook                          provider callback (POST)
/// /payments/{transaction_id}                 ledger row (GET)
///
/// /plans                                     plan catalog (GET)
/// /users/{user_id}/plan                      current plan (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/onboarding", onboarding::router())
        .nest("/payments", payments::router())
        .merge(plans::router())
}
