//! Handlers for the mobile onboarding flow.
//!
//! Each handler deserializes its step's body and delegates to
//! [`OnboardingOrchestrator`](crate::onboarding::OnboardingOrchestrator).
//! Caller identity arrives as `user_id` in the body; authentication is
//! applied upstream.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use linkup_core::types::DbId;
use linkup_db::models::interest::Interest;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::json::JsonBody;
use crate::response::{ApiResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct InitiatePhoneRequest {
    pub phone_number: String,
    pub country_code: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub user_id: DbId,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionTypeRequest {
    pub user_id: DbId,
    pub connection_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRadiusRequest {
    pub user_id: DbId,
    pub radius: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReferralCodeRequest {
    pub user_id: DbId,
    pub referral_code: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverySourcesRequest {
    pub user_id: DbId,
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterestsQuery {
    pub user_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct InterestsRequest {
    pub user_id: DbId,
    pub interest_ids: Vec<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct IntroductionRequest {
    pub user_id: DbId,
    pub bio: String,
}

#[derive(Debug, Deserialize)]
pub struct IntroductionAnswersRequest {
    pub user_id: DbId,
    pub answers: HashMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub user_id: DbId,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UserIdRequest {
    pub user_id: DbId,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct VerifiedPayload {
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct InterestsPayload {
    pub interests: Vec<Interest>,
    /// Present when the request named a user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_ids: Option<Vec<DbId>>,
}

#[derive(Debug, Serialize)]
pub struct SelectionPayload {
    /// Ids actually stored, after dropping unknown or inactive ones.
    pub interest_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// POST /onboarding/phone/initiate
// ---------------------------------------------------------------------------

pub async fn initiate_phone(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<InitiatePhoneRequest>,
) -> AppResult<impl IntoResponse> {
    let initiation = state
        .onboarding
        .initiate_phone_verification(&input.phone_number, &input.country_code)
        .await?;
    Ok(Json(ApiResponse::ok(initiation)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/phone/verify
// ---------------------------------------------------------------------------

pub async fn verify_phone(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<VerifyOtpRequest>,
) -> AppResult<impl IntoResponse> {
    state.onboarding.verify_otp(input.user_id, &input.otp).await?;
    Ok(Json(ApiResponse::ok(VerifiedPayload { verified: true })))
}

// ---------------------------------------------------------------------------
// POST /onboarding/connection-type
// ---------------------------------------------------------------------------

pub async fn set_connection_type(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ConnectionTypeRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .onboarding
        .set_connection_type(input.user_id, &input.connection_type)
        .await?;
    Ok(Json(ApiResponse::ok(user)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/search-radius
// ---------------------------------------------------------------------------

pub async fn set_search_radius(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SearchRadiusRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .onboarding
        .set_search_radius(input.user_id, input.radius)
        .await?;
    Ok(Json(ApiResponse::ok(user)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/referral-code
// ---------------------------------------------------------------------------

pub async fn apply_referral_code(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ReferralCodeRequest>,
) -> AppResult<impl IntoResponse> {
    let applied = state
        .onboarding
        .apply_referral_code(input.user_id, &input.referral_code)
        .await?;
    Ok(Json(ApiResponse::ok(applied)))
}

// ---------------------------------------------------------------------------
// GET /onboarding/referral-code/{user_id}
// ---------------------------------------------------------------------------

pub async fn get_own_referral_code(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let code = state.onboarding.referral_code_for(user_id).await?;
    Ok(Json(ApiResponse::ok(code)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/discovery-sources
// ---------------------------------------------------------------------------

pub async fn set_discovery_sources(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<DiscoverySourcesRequest>,
) -> AppResult<impl IntoResponse> {
    let sources = state
        .onboarding
        .set_discovery_sources(input.user_id, &input.sources)
        .await?;
    Ok(Json(ApiResponse::ok(sources)))
}

// ---------------------------------------------------------------------------
// GET /onboarding/interests
// ---------------------------------------------------------------------------

/// The active interest catalog, plus the user's current selection when
/// `?user_id=` is given.
pub async fn list_interests(
    State(state): State<AppState>,
    Query(query): Query<InterestsQuery>,
) -> AppResult<impl IntoResponse> {
    let interests = state.onboarding.list_interests().await?;
    let selected_ids = match query.user_id {
        Some(user_id) => Some(
            state
                .onboarding
                .user_interests(user_id)
                .await?
                .into_iter()
                .map(|i| i.id)
                .collect(),
        ),
        None => None,
    };
    Ok(Json(ApiResponse::ok(InterestsPayload {
        interests,
        selected_ids,
    })))
}

// ---------------------------------------------------------------------------
// POST /onboarding/interests
// ---------------------------------------------------------------------------

pub async fn set_interests(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<InterestsRequest>,
) -> AppResult<impl IntoResponse> {
    let stored = state
        .onboarding
        .set_interests(input.user_id, &input.interest_ids)
        .await?;
    Ok(Json(ApiResponse::ok(SelectionPayload {
        interest_ids: stored,
    })))
}

// ---------------------------------------------------------------------------
// POST /onboarding/introduction
// ---------------------------------------------------------------------------

pub async fn set_introduction(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<IntroductionRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .onboarding
        .set_introduction(input.user_id, &input.bio)
        .await?;
    Ok(Json(ApiResponse::ok(user)))
}

// ---------------------------------------------------------------------------
// GET /onboarding/introduction-questions
// ---------------------------------------------------------------------------

pub async fn list_introduction_questions(
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let questions = state.onboarding.list_introduction_questions().await?;
    Ok(Json(ApiResponse::ok(questions)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/introduction-answers
// ---------------------------------------------------------------------------

pub async fn set_introduction_answers(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<IntroductionAnswersRequest>,
) -> AppResult<impl IntoResponse> {
    let saved = state
        .onboarding
        .set_introduction_answers(input.user_id, &input.answers)
        .await?;
    Ok(Json(ApiResponse::ok(saved)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/email
// ---------------------------------------------------------------------------

pub async fn set_email(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<EmailRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.onboarding.set_email(input.user_id, &input.email).await?;
    Ok(Json(ApiResponse::ok(user)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/complete
// ---------------------------------------------------------------------------

pub async fn complete(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<UserIdRequest>,
) -> AppResult<impl IntoResponse> {
    state.onboarding.complete_onboarding(input.user_id).await?;
    Ok(Json(MessageResponse::ok("Onboarding completed")))
}

// ---------------------------------------------------------------------------
// GET /onboarding/status/{user_id}
// ---------------------------------------------------------------------------

pub async fn get_status(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let status = state.onboarding.status(user_id).await?;
    Ok(Json(ApiResponse::ok(status)))
}
