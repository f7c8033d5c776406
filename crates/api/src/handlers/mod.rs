pub mod onboarding;
pub mod payments;
pub mod plans;
