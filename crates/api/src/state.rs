use std::sync::Arc;

use linkup_core::plans::PlanCatalog;

use crate::config::ServerConfig;
use crate::onboarding::OnboardingOrchestrator;
use crate::otp_sender::OtpSender;
use crate::payments::PaymentReconciler;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: linkup_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Read-only plan tier table.
    pub plans: Arc<PlanCatalog>,
    /// Onboarding step service.
    pub onboarding: Arc<OnboardingOrchestrator>,
    /// Payment webhook service.
    pub payments: Arc<PaymentReconciler>,
}

impl AppState {
    /// Wire the services around a pool, configuration, and plan catalog.
    pub fn new(
        pool: linkup_db::DbPool,
        config: ServerConfig,
        plans: PlanCatalog,
        otp_sender: Arc<dyn OtpSender>,
    ) -> Self {
        let plans = Arc::new(plans);
        let onboarding = Arc::new(OnboardingOrchestrator::new(
            pool.clone(),
            otp_sender,
            config.otp_ttl_secs,
        ));
        let payments = Arc::new(PaymentReconciler::new(pool.clone(), Arc::clone(&plans)));

        Self {
            pool,
            config: Arc::new(config),
            plans,
            onboarding,
            payments,
        }
    }
}
