//! Route definitions for plans. Merged at the `/api/v1` root.

use axum::routing::get;
use axum::Router;

use crate::handlers::plans;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(plans::list_plans))
        .route("/users/{user_id}/plan", get(plans::get_user_plan))
}
