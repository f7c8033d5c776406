//! Payment webhook reconciliation.

pub mod reconciler;

pub use reconciler::{PaymentReconciler, ReconcileOutcome};
