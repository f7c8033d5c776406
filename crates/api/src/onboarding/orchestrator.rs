//! Onboarding orchestrator.
//!
//! Each step validates its input, loads the user, and applies one targeted
//! update. Steps carry no ordering between them; callers sequence them.
//! Held in [`AppState`](crate::state::AppState) as an
//! `Arc<OnboardingOrchestrator>`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use linkup_core::error::CoreError;
use linkup_core::onboarding::{
    self, ConnectionType, DiscoverySource, OnboardingProgress, OnboardingStep,
};
use linkup_core::otp::{self, OtpChallenge};
use linkup_core::phone;
use linkup_core::referral::{self, CodeState, ReferralApplication};
use linkup_core::types::{DbId, Timestamp};
use linkup_db::models::interest::Interest;
use linkup_db::models::introduction::{IntroductionAnswer, OnboardingQuestion, UpsertAnswer};
use linkup_db::models::referral_code::ReferralCode;
use linkup_db::models::user::{CreateUser, User};
use linkup_db::repositories::{
    InterestRepo, IntroductionAnswerRepo, OnboardingQuestionRepo, ReferralCodeRepo, UserRepo,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::otp_sender::OtpSender;

/// Attempts at drawing a referral code that no other user holds.
const REFERRAL_CODE_ATTEMPTS: usize = 5;

// ---------------------------------------------------------------------------
// Step results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PhoneInitiation {
    pub user_id: DbId,
    pub otp_expires_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralApplied {
    pub referral_code: String,
    pub referred_by_user_id: DbId,
    /// `false` when the same code had already been applied.
    pub newly_applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub user_id: DbId,
    pub phone_verified: bool,
    pub onboarding_completed: bool,
    pub completed_steps: Vec<OnboardingStep>,
    pub next_step: Option<OnboardingStep>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct OnboardingOrchestrator {
    pool: PgPool,
    otp_sender: Arc<dyn OtpSender>,
    otp_ttl_secs: i64,
}

impl OnboardingOrchestrator {
    pub fn new(pool: PgPool, otp_sender: Arc<dyn OtpSender>, otp_ttl_secs: i64) -> Self {
        Self {
            pool,
            otp_sender,
            otp_ttl_secs,
        }
    }

    /// Find or create the user for a phone number and issue a fresh OTP.
    ///
    /// Re-initiating overwrites any pending OTP. A concurrent first-time
    /// initiation for the same number loses on `uq_users_phone` and falls
    /// back to a lookup.
    pub async fn initiate_phone_verification(
        &self,
        phone_number: &str,
        country_code: &str,
    ) -> AppResult<PhoneInitiation> {
        let phone = phone::normalize(phone_number, country_code)?;
        let challenge = OtpChallenge::issue(Utc::now(), self.otp_ttl_secs);

        let user_id = match UserRepo::find_by_phone(
            &self.pool,
            &phone.phone_number,
            &phone.country_code,
        )
        .await?
        {
            Some(user) => {
                self.reissue(user.id, &challenge).await?;
                user.id
            }
            None => {
                let input = CreateUser {
                    phone_number: phone.phone_number.clone(),
                    country_code: phone.country_code.clone(),
                    otp_code: challenge.code.clone(),
                    otp_expires_at: challenge.expires_at,
                };
                match UserRepo::create(&self.pool, &input).await {
                    Ok(user) => user.id,
                    Err(e) if linkup_db::is_unique_violation(&e, Some("uq_users_phone")) => {
                        tracing::debug!(
                            phone = %phone::mask(&phone.phone_number),
                            "Concurrent initiation won the insert, retrying as lookup"
                        );
                        let user = UserRepo::find_by_phone(
                            &self.pool,
                            &phone.phone_number,
                            &phone.country_code,
                        )
                        .await?
                        .ok_or_else(|| {
                            AppError::Core(CoreError::Conflict(
                                "Phone number is being registered concurrently".to_string(),
                            ))
                        })?;
                        self.reissue(user.id, &challenge).await?;
                        user.id
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        if let Err(e) = self.otp_sender.send(&phone, &challenge.code).await {
            tracing::warn!(user_id, error = %e, "OTP delivery failed");
        }

        tracing::info!(
            user_id,
            phone = %phone::mask(&phone.phone_number),
            "Phone verification initiated"
        );

        Ok(PhoneInitiation {
            user_id,
            otp_expires_at: challenge.expires_at,
        })
    }

    /// Verify a submitted OTP and mark the phone verified.
    ///
    /// The stored code is cleared by the same statement that verifies it,
    /// so a code can only succeed once.
    pub async fn verify_otp(&self, user_id: DbId, submitted: &str) -> AppResult<User> {
        if !otp::is_well_formed(submitted) {
            return Err(CoreError::Validation(format!(
                "OTP must be a {}-digit code",
                otp::OTP_LENGTH
            ))
            .into());
        }

        let user = self.load_user(user_id).await?;

        let challenge = match (user.otp_code, user.otp_expires_at) {
            (Some(code), Some(expires_at)) => Some(OtpChallenge { code, expires_at }),
            _ => None,
        };
        if !challenge.is_some_and(|c| c.accepts(submitted, Utc::now())) {
            tracing::info!(user_id, "OTP rejected");
            return Err(CoreError::InvalidOtp.into());
        }

        let verified = UserRepo::consume_otp(&self.pool, user_id, submitted)
            .await?
            .ok_or(CoreError::InvalidOtp)?;

        tracing::info!(user_id, "Phone verified");
        Ok(verified)
    }

    pub async fn set_connection_type(&self, user_id: DbId, raw: &str) -> AppResult<User> {
        let connection_type: ConnectionType = raw.parse()?;
        let user = UserRepo::set_connection_type(&self.pool, user_id, connection_type.as_str())
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;

        tracing::info!(user_id, connection_type = connection_type.as_str(), "Connection type set");
        Ok(user)
    }

    pub async fn set_search_radius(&self, user_id: DbId, radius: i32) -> AppResult<User> {
        onboarding::validate_search_radius(radius)?;
        let user = UserRepo::set_search_radius(&self.pool, user_id, radius)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;

        tracing::info!(user_id, radius, "Search radius set");
        Ok(user)
    }

    /// Apply someone else's referral code to this user.
    ///
    /// The user and code rows are locked for the duration so the usage
    /// counter and the referrer link change together.
    pub async fn apply_referral_code(
        &self,
        user_id: DbId,
        raw_code: &str,
    ) -> AppResult<ReferralApplied> {
        let code = referral::normalize_code(raw_code)?;

        let mut tx = self.pool.begin().await?;

        let user = UserRepo::find_for_update(&mut tx, user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;
        let referral = ReferralCodeRepo::find_by_code_for_update(&mut tx, &code)
            .await?
            .ok_or(CoreError::InvalidReferralCode)?;

        let decision = referral::evaluate(
            CodeState {
                code: &referral.code,
                owner_id: referral.user_id,
                is_active: referral.is_active,
            },
            user_id,
            user.referral_code_used.as_deref(),
        )?;

        let newly_applied = match decision {
            ReferralApplication::Increment => {
                ReferralCodeRepo::increment_usage(&mut tx, referral.id).await?;
                UserRepo::set_referrer(&mut tx, user_id, referral.user_id, &referral.code).await?;
                true
            }
            ReferralApplication::AlreadyApplied => false,
        };

        tx.commit().await?;

        tracing::info!(
            user_id,
            referrer_id = referral.user_id,
            newly_applied,
            "Referral code applied"
        );

        Ok(ReferralApplied {
            referral_code: referral.code,
            referred_by_user_id: referral.user_id,
            newly_applied,
        })
    }

    pub async fn set_discovery_sources(
        &self,
        user_id: DbId,
        raw: &[String],
    ) -> AppResult<Vec<DiscoverySource>> {
        let sources = onboarding::parse_discovery_sources(raw)?;
        let value = serde_json::to_value(&sources)
            .map_err(|e| AppError::InternalError(format!("Cannot encode sources: {e}")))?;

        UserRepo::set_discovery_sources(&self.pool, user_id, &value)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;

        tracing::info!(user_id, count = sources.len(), "Discovery sources set");
        Ok(sources)
    }

    pub async fn list_interests(&self) -> AppResult<Vec<Interest>> {
        Ok(InterestRepo::list_active(&self.pool).await?)
    }

    pub async fn user_interests(&self, user_id: DbId) -> AppResult<Vec<Interest>> {
        self.load_user(user_id).await?;
        Ok(InterestRepo::list_for_user(&self.pool, user_id).await?)
    }

    /// Replace the user's interest selection. Ids outside the active catalog
    /// are dropped. Returns the ids stored.
    pub async fn set_interests(&self, user_id: DbId, ids: &[DbId]) -> AppResult<Vec<DbId>> {
        let ids = onboarding::validate_interest_ids(ids)?;
        self.load_user(user_id).await?;

        let stored = InterestRepo::replace_for_user(&self.pool, user_id, &ids).await?;

        tracing::info!(user_id, count = stored.len(), "Interests replaced");
        Ok(stored)
    }

    pub async fn set_introduction(&self, user_id: DbId, bio: &str) -> AppResult<User> {
        let bio = onboarding::validate_bio(bio)?;
        let user = UserRepo::set_bio(&self.pool, user_id, &bio)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;

        tracing::info!(user_id, "Introduction set");
        Ok(user)
    }

    pub async fn list_introduction_questions(&self) -> AppResult<Vec<OnboardingQuestion>> {
        Ok(OnboardingQuestionRepo::list_active(&self.pool).await?)
    }

    /// Store answers keyed by question key. Unknown keys are ignored and
    /// blank answers clear any previous answer.
    pub async fn set_introduction_answers(
        &self,
        user_id: DbId,
        answers: &HashMap<String, Option<String>>,
    ) -> AppResult<Vec<IntroductionAnswer>> {
        self.load_user(user_id).await?;

        let questions = OnboardingQuestionRepo::list_active(&self.pool).await?;
        let rules: Vec<_> = questions.iter().map(OnboardingQuestion::rule).collect();
        let prepared = onboarding::prepare_answers(&rules, answers)?;

        let ids_by_key: HashMap<&str, DbId> = questions
            .iter()
            .map(|q| (q.question_key.as_str(), q.id))
            .collect();
        let rows: Vec<UpsertAnswer> = prepared
            .into_iter()
            .filter_map(|p| {
                ids_by_key.get(p.question_key.as_str()).map(|&question_id| UpsertAnswer {
                    question_id,
                    answer: p.answer,
                })
            })
            .collect();

        let saved = IntroductionAnswerRepo::upsert_many(&self.pool, user_id, &rows).await?;

        tracing::info!(user_id, count = saved.len(), "Introduction answers saved");
        Ok(saved)
    }

    /// Set the contact email used to link incoming payments to the user.
    pub async fn set_email(&self, user_id: DbId, email: &str) -> AppResult<User> {
        let email = onboarding::validate_email(email)?;
        let user = UserRepo::set_email(&self.pool, user_id, &email)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;

        tracing::info!(user_id, "Contact email set");
        Ok(user)
    }

    /// Mark onboarding complete. Earlier steps are not checked.
    pub async fn complete_onboarding(&self, user_id: DbId) -> AppResult<User> {
        let user = UserRepo::complete_onboarding(&self.pool, user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;

        tracing::info!(user_id, "Onboarding completed");
        Ok(user)
    }

    /// The user's own shareable code, created on first request.
    pub async fn referral_code_for(&self, user_id: DbId) -> AppResult<ReferralCode> {
        self.load_user(user_id).await?;

        if let Some(existing) = ReferralCodeRepo::find_by_user(&self.pool, user_id).await? {
            return Ok(existing);
        }

        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let candidate = referral::generate_referral_code();
            match ReferralCodeRepo::get_or_create(&self.pool, user_id, &candidate).await {
                Ok(code) => {
                    tracing::info!(user_id, "Referral code issued");
                    return Ok(code);
                }
                Err(e) if linkup_db::is_unique_violation(&e, Some("uq_referral_codes_code")) => {
                    tracing::debug!(user_id, "Referral code collision, drawing again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::InternalError(format!(
            "Could not allocate a unique referral code after {REFERRAL_CODE_ATTEMPTS} attempts"
        )))
    }

    /// Which steps have data on the user's profile.
    pub async fn status(&self, user_id: DbId) -> AppResult<OnboardingStatus> {
        let user = self.load_user(user_id).await?;
        let interest_count = InterestRepo::count_for_user(&self.pool, user_id).await?;
        let answer_count = IntroductionAnswerRepo::count_answered(&self.pool, user_id).await?;

        let progress = OnboardingProgress::from_fn(|step| match step {
            OnboardingStep::PhoneVerification => user.is_phone_verified(),
            OnboardingStep::ConnectionType => user.connection_type.is_some(),
            OnboardingStep::SearchRadius => user.search_radius.is_some(),
            OnboardingStep::ReferralCode => user.referral_code_used.is_some(),
            OnboardingStep::DiscoverySources => user.has_discovery_sources(),
            OnboardingStep::Interests => interest_count > 0,
            OnboardingStep::Introduction => user.bio.is_some(),
            OnboardingStep::IntroductionAnswers => answer_count > 0,
            OnboardingStep::Completion => user.onboarding_completed,
        });

        Ok(OnboardingStatus {
            user_id,
            phone_verified: user.is_phone_verified(),
            onboarding_completed: progress.onboarding_completed,
            completed_steps: progress.completed_steps,
            next_step: progress.next_step,
        })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn load_user(&self, user_id: DbId) -> AppResult<User> {
        UserRepo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "User",
                    id: user_id,
                }
                .into()
            })
    }

    async fn reissue(&self, user_id: DbId, challenge: &OtpChallenge) -> AppResult<()> {
        let updated =
            UserRepo::set_otp(&self.pool, user_id, &challenge.code, challenge.expires_at).await?;
        if !updated {
            return Err(CoreError::NotFound {
                entity: "User",
                id: user_id,
            }
            .into());
        }
        Ok(())
    }
}
