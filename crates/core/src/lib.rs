//! Linkup domain core.
//!
//! Pure, I/O-free building blocks shared by the database and API layers:
//! OTP challenges, referral codes, onboarding input validation, the plan
//! catalog, and payment webhook parsing.

pub mod error;
pub mod onboarding;
pub mod otp;
pub mod phone;
pub mod plans;
pub mod referral;
pub mod types;
pub mod webhook;
