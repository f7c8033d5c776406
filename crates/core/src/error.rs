use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Invalid or inactive referral code")]
    InvalidReferralCode,

    #[error("You cannot apply your own referral code")]
    SelfReferralNotAllowed,

    #[error("Malformed webhook: {0}")]
    MalformedWebhook(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
