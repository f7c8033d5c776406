//! Handlers for the plan catalog and per-user subscription lookups.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use linkup_core::error::CoreError;
use linkup_core::types::DbId;
use linkup_db::repositories::{UserPlanRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /plans
// ---------------------------------------------------------------------------

pub async fn list_plans(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(ApiResponse::ok(state.plans.tiers.clone())))
}

// ---------------------------------------------------------------------------
// GET /users/{user_id}/plan
// ---------------------------------------------------------------------------

/// The user's current plan. 404 when the user has never paid.
pub async fn get_user_plan(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    let plan = UserPlanRepo::find_by_user(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "UserPlan",
            id: user_id,
        }))?;

    tracing::debug!(user_id, plan_id = %plan.plan_id, "Fetched user plan");

    Ok(Json(ApiResponse::ok(plan)))
}
