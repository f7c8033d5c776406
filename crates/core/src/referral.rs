//! Referral code generation and application rules.
//!
//! Codes are case-sensitive. A code may be applied by any user other than
//! its owner; each new application increments the owner's usage counter.

use rand::Rng;

use crate::error::CoreError;
use crate::types::DbId;

/// Length of a generated referral code.
pub const REFERRAL_CODE_LENGTH: usize = 8;

/// Longest code string accepted from clients (pre-seeded codes may be
/// longer than generated ones).
pub const MAX_REFERRAL_CODE_LENGTH: usize = 32;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a random referral code from an unambiguous uppercase alphabet.
pub fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trim a client-submitted code and check its length. Case is preserved.
pub fn normalize_code(input: &str) -> Result<String, CoreError> {
    let code = input.trim();
    if code.is_empty() {
        return Err(CoreError::Validation(
            "Referral code must not be empty".to_string(),
        ));
    }
    if code.chars().count() > MAX_REFERRAL_CODE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Referral code must be at most {MAX_REFERRAL_CODE_LENGTH} characters"
        )));
    }
    Ok(code.to_string())
}

/// What applying a code means for the usage counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralApplication {
    /// First application of this code by the user: increment usage.
    Increment,
    /// The user already applied this exact code: nothing changes.
    AlreadyApplied,
}

/// The stored state of a code being applied.
#[derive(Debug, Clone, Copy)]
pub struct CodeState<'a> {
    pub code: &'a str,
    pub owner_id: DbId,
    pub is_active: bool,
}

/// Decide whether `applicant_id` may apply `code`.
///
/// `applied_code` is the code currently recorded on the applicant, if any.
pub fn evaluate(
    code: CodeState<'_>,
    applicant_id: DbId,
    applied_code: Option<&str>,
) -> Result<ReferralApplication, CoreError> {
    if !code.is_active {
        return Err(CoreError::InvalidReferralCode);
    }
    if code.owner_id == applicant_id {
        return Err(CoreError::SelfReferralNotAllowed);
    }
    if applied_code == Some(code.code) {
        return Ok(ReferralApplication::AlreadyApplied);
    }
    Ok(ReferralApplication::Increment)
}
