//! Linkup API server library.
//!
//! Exposes config, state, error handling, the onboarding and payment
//! services, and routes so integration tests and the binary entrypoint can
//! both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod onboarding;
pub mod otp_sender;
pub mod payments;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
