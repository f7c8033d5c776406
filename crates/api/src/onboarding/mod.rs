//! Onboarding step service.
//!
//! [`OnboardingOrchestrator`] exposes one operation per onboarding step on
//! top of the pure validation in `linkup_core::onboarding`.

pub mod orchestrator;

pub use orchestrator::OnboardingOrchestrator;
