//! Database entity models and DTOs.

pub mod interest;
pub mod introduction;
pub mod payment;
pub mod referral_code;
pub mod user;
pub mod user_plan;
pub mod webhook_log;
