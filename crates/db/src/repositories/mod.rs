//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool`, or a `&mut Transaction` for steps that must share one.

pub mod interest_repo;
pub mod introduction_repo;
pub mod payment_repo;
pub mod referral_code_repo;
pub mod user_plan_repo;
pub mod user_repo;
pub mod webhook_log_repo;

pub use interest_repo::InterestRepo;
pub use introduction_repo::{IntroductionAnswerRepo, OnboardingQuestionRepo};
pub use payment_repo::PaymentRepo;
pub use referral_code_repo::ReferralCodeRepo;
pub use user_plan_repo::UserPlanRepo;
pub use user_repo::UserRepo;
pub use webhook_log_repo::WebhookLogRepo;
