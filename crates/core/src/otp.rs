//! One-time passcodes for phone verification.
//!
//! A challenge is a 6-digit, zero-padded numeric string with an absolute
//! expiry. Codes are compared as strings so leading zeros are significant.

use chrono::Duration;
use rand::Rng;

use crate::types::Timestamp;

/// Number of digits in a generated code.
pub const OTP_LENGTH: usize = 6;

/// Default lifetime of an issued code, in seconds.
pub const DEFAULT_OTP_TTL_SECS: i64 = 300;

/// Generate a fresh zero-padded 6-digit code.
pub fn generate_otp() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Whether `code` has the shape of an OTP (exactly six ASCII digits).
pub fn is_well_formed(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// An issued, not yet consumed, passcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub code: String,
    pub expires_at: Timestamp,
}

impl OtpChallenge {
    /// Issue a new random challenge valid for `ttl_secs` from `now`.
    pub fn issue(now: Timestamp, ttl_secs: i64) -> Self {
        Self {
            code: generate_otp(),
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// A submitted code is accepted only on an exact string match strictly
    /// before expiry.
    pub fn accepts(&self, submitted: &str, now: Timestamp) -> bool {
        !self.is_expired(now) && self.code == submitted
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn challenge(code: &str, expires_in_secs: i64) -> (OtpChallenge, Timestamp) {
        let now = Utc::now();
        (
            OtpChallenge {
                code: code.to_string(),
                expires_at: now + Duration::seconds(expires_in_secs),
            },
            now,
        )
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_otp();
            assert!(is_well_formed(&code), "bad code {code}");
        }
    }

    #[test]
    fn issue_sets_expiry_from_ttl() {
        let now = Utc::now();
        let c = OtpChallenge::issue(now, DEFAULT_OTP_TTL_SECS);
        assert_eq!(c.expires_at - now, Duration::seconds(300));
        assert!(is_well_formed(&c.code));
    }

    #[test]
    fn well_formed_rejects_other_shapes() {
        assert!(is_well_formed("000123"));
        assert!(!is_well_formed("12345"));
        assert!(!is_well_formed("1234567"));
        assert!(!is_well_formed("12a456"));
        assert!(!is_well_formed(" 12345"));
    }

    #[test]
    fn accepts_exact_match_before_expiry() {
        let (c, now) = challenge("004217", 60);
        assert!(c.accepts("004217", now));
    }

    #[test]
    fn leading_zeros_are_significant() {
        let (c, now) = challenge("004217", 60);
        assert!(!c.accepts("4217", now));
        assert!(!c.accepts("04217", now));
    }

    #[test]
    fn rejects_mismatch() {
        let (c, now) = challenge("123456", 60);
        assert!(!c.accepts("654321", now));
    }

    #[test]
    fn rejects_at_and_after_expiry() {
        let (c, now) = challenge("123456", 60);
        assert!(!c.accepts("123456", c.expires_at));
        assert!(!c.accepts("123456", now + Duration::seconds(61)));
    }
}
