//! Payment webhook reconciler.
//!
//! Turns a provider delivery into ledger and subscription state exactly once
//! per transaction id:
//!
//! 1. Write the raw body to the audit log in the background.
//! 2. Parse it, failing closed on missing transaction id or email.
//! 3. Resolve the plan tier from the amount.
//! 4. Success statuses: in one transaction, skip known transaction ids,
//!    otherwise insert a completed payment and activate the payer's plan.
//! 5. Other statuses: insert a failed or pending payment, no transaction.
//!
//! Held in [`AppState`](crate::state::AppState) as an `Arc<PaymentReconciler>`.

use std::sync::Arc;

use linkup_core::error::CoreError;
use linkup_core::plans::{PlanCatalog, PlanTier};
use linkup_core::types::DbId;
use linkup_core::webhook::{ParsedWebhook, PaymentStatus};
use linkup_db::models::payment::{CreatePayment, Payment};
use linkup_db::models::user_plan::{ActivatePlan, UserPlan};
use linkup_db::models::webhook_log::SOURCE_PAYMENT_PROVIDER;
use linkup_db::repositories::{PaymentRepo, UserPlanRepo, UserRepo, WebhookLogRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// What a delivery did.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Successful payment recorded. `user_plan` is `None` when no user
    /// matched the payer email.
    Processed {
        payment: Payment,
        user_plan: Option<UserPlan>,
    },
    /// Failed or pending payment recorded for audit.
    Recorded { payment: Payment },
    /// The transaction id was already in the ledger.
    AlreadyProcessed,
}

impl ReconcileOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Processed { .. } => "Payment processed successfully".to_string(),
            Self::Recorded { payment } => format!("Payment recorded with status {}", payment.status),
            Self::AlreadyProcessed => "Already processed".to_string(),
        }
    }
}

pub struct PaymentReconciler {
    pool: PgPool,
    plans: Arc<PlanCatalog>,
}

impl PaymentReconciler {
    pub fn new(pool: PgPool, plans: Arc<PlanCatalog>) -> Self {
        Self { pool, plans }
    }

    /// Handle one raw webhook body.
    ///
    /// Non-JSON bodies are still written to the audit log, as a JSON string.
    pub async fn process(&self, body: &[u8]) -> AppResult<ReconcileOutcome> {
        let parsed_body = serde_json::from_slice::<serde_json::Value>(body);

        let audit_payload = match &parsed_body {
            Ok(value) => value.clone(),
            Err(_) => serde_json::Value::String(String::from_utf8_lossy(body).into_owned()),
        };
        self.spawn_audit(audit_payload);

        let payload = parsed_body
            .map_err(|e| CoreError::MalformedWebhook(format!("body is not valid JSON: {e}")))?;
        self.reconcile(payload).await
    }

    /// Reconcile an already-decoded payload. Does not write the audit log.
    pub async fn reconcile(&self, payload: serde_json::Value) -> AppResult<ReconcileOutcome> {
        let webhook = ParsedWebhook::from_value(&payload)?;
        let plan = self
            .plans
            .resolve_for_amount(webhook.amount)
            .ok_or_else(|| AppError::InternalError("Plan catalog is empty".to_string()))?;

        tracing::debug!(
            transaction_id = %webhook.transaction_id,
            provider_status = %webhook.raw_status,
            amount = webhook.amount,
            plan_id = %plan.id,
            "Reconciling payment webhook"
        );

        match webhook.status {
            PaymentStatus::Completed => self.record_success(&webhook, plan, payload).await,
            PaymentStatus::Failed | PaymentStatus::Pending => {
                self.record_unsuccessful(&webhook, plan, payload).await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    async fn record_success(
        &self,
        webhook: &ParsedWebhook,
        plan: &PlanTier,
        payload: serde_json::Value,
    ) -> AppResult<ReconcileOutcome> {
        let mut tx = self.pool.begin().await?;

        if PaymentRepo::find_by_transaction_id_in_tx(&mut tx, &webhook.transaction_id)
            .await?
            .is_some()
        {
            tx.commit().await?;
            tracing::info!(transaction_id = %webhook.transaction_id, "Duplicate webhook ignored");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        let user = UserRepo::find_by_email_in_tx(&mut tx, &webhook.customer_email).await?;
        let user_id = user.map(|u| u.id);

        let input = new_payment(webhook, plan, user_id, payload);
        // A concurrent delivery that committed first makes this a no-op.
        let Some(payment) = PaymentRepo::insert_if_absent_in_tx(&mut tx, &input).await? else {
            tx.rollback().await?;
            tracing::info!(transaction_id = %webhook.transaction_id, "Duplicate webhook ignored");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        };

        let user_plan = match user_id {
            Some(user_id) => Some(
                UserPlanRepo::activate(
                    &mut tx,
                    &ActivatePlan {
                        user_id,
                        plan_id: plan.id.clone(),
                        transaction_id: webhook.transaction_id.clone(),
                    },
                )
                .await?,
            ),
            None => None,
        };

        tx.commit().await?;

        match user_id {
            Some(user_id) => tracing::info!(
                transaction_id = %webhook.transaction_id,
                user_id,
                plan_id = %plan.id,
                "Payment completed and plan activated"
            ),
            None => tracing::warn!(
                transaction_id = %webhook.transaction_id,
                plan_id = %plan.id,
                "Payment completed but no user matches the payer email"
            ),
        }

        Ok(ReconcileOutcome::Processed { payment, user_plan })
    }

    async fn record_unsuccessful(
        &self,
        webhook: &ParsedWebhook,
        plan: &PlanTier,
        payload: serde_json::Value,
    ) -> AppResult<ReconcileOutcome> {
        let user_id = UserRepo::find_by_email(&self.pool, &webhook.customer_email)
            .await?
            .map(|u| u.id);

        let input = new_payment(webhook, plan, user_id, payload);
        match PaymentRepo::insert_if_absent(&self.pool, &input).await? {
            Some(payment) => {
                tracing::info!(
                    transaction_id = %webhook.transaction_id,
                    status = %payment.status,
                    "Unsuccessful payment recorded"
                );
                Ok(ReconcileOutcome::Recorded { payment })
            }
            None => {
                tracing::info!(transaction_id = %webhook.transaction_id, "Duplicate webhook ignored");
                Ok(ReconcileOutcome::AlreadyProcessed)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Audit log
    // -----------------------------------------------------------------------

    /// Write the payload to `webhook_logs` without waiting for it. Failures
    /// are logged and otherwise ignored.
    fn spawn_audit(&self, payload: serde_json::Value) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let transaction_id = loose_transaction_id(&payload);
            if let Err(e) = WebhookLogRepo::insert(
                &pool,
                SOURCE_PAYMENT_PROVIDER,
                transaction_id.as_deref(),
                &payload,
            )
            .await
            {
                tracing::warn!(error = %e, "Failed to write webhook audit log");
            }
        });
    }
}

fn new_payment(
    webhook: &ParsedWebhook,
    plan: &PlanTier,
    user_id: Option<DbId>,
    payload: serde_json::Value,
) -> CreatePayment {
    CreatePayment {
        user_id,
        transaction_id: webhook.transaction_id.clone(),
        payer_email: webhook.customer_email.clone(),
        payer_name: webhook.payer_name.clone(),
        plan_id: plan.id.clone(),
        amount: webhook.amount,
        currency: webhook.currency.clone(),
        status: webhook.status.as_str().to_string(),
        provider_status: webhook.raw_status.clone(),
        raw_payload: payload,
    }
}

/// Best-effort transaction id for indexing the audit log, before the
/// payload has been validated.
fn loose_transaction_id(payload: &serde_json::Value) -> Option<String> {
    match payload.get("transaction_id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
