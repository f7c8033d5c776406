//! Route definitions for the onboarding flow.
//!
//! Mounted at `/onboarding` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/phone/initiate", post(onboarding::initiate_phone))
        .route("/phone/verify", post(onboarding::verify_phone))
        .route("/connection-type", post(onboarding::set_connection_type))
        .route("/search-radius", post(onboarding::set_search_radius))
        .route("/referral-code", post(onboarding::apply_referral_code))
        .route(
            "/referral-code/{user_id}",
            get(onboarding::get_own_referral_code),
        )
        .route(
            "/discovery-sources",
            post(onboarding::set_discovery_sources),
        )
        .route(
            "/interests",
            get(onboarding::list_interests).post(onboarding::set_interests),
        )
        .route("/introduction", post(onboarding::set_introduction))
        .route(
            "/introduction-questions",
            get(onboarding::list_introduction_questions),
        )
        .route(
            "/introduction-answers",
            post(onboarding::set_introduction_answers),
        )
        .route("/email", post(onboarding::set_email))
        .route("/complete", post(onboarding::complete))
        .route("/status/{user_id}", get(onboarding::get_status))
}
