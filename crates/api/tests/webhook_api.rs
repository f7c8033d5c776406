//! Integration tests for payment webhook reconciliation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::Router;
use common::{body_json, get, post_json, post_raw};
use linkup_api::payments::{PaymentReconciler, ReconcileOutcome};
use linkup_core::plans::PlanCatalog;
use linkup_core::types::DbId;
use linkup_db::repositories::{PaymentRepo, UserPlanRepo, WebhookLogRepo};
use serde_json::json;
use sqlx::PgPool;

const WEBHOOK: &str = "/api/v1/payments/webhook";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a verified user with a contact email through the API.
async fn user_with_email(app: &Router, pool: &PgPool, phone: &str, email: &str) -> DbId {
    let response = post_json(
        app.clone(),
        "/api/v1/onboarding/phone/initiate",
        json!({ "phone_number": phone, "country_code": "+1" }),
    )
    .await;
    let user_id = body_json(response).await["data"]["user_id"].as_i64().unwrap();

    let response = post_json(
        app.clone(),
        "/api/v1/onboarding/email",
        json!({ "user_id": user_id, "email": email }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (stored,): (Option<String>,) = sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some(email.to_lowercase().as_str()));
    user_id
}

fn delivery(
    transaction_id: &str,
    status: &str,
    amount: serde_json::Value,
    email: &str,
) -> serde_json::Value {
    json!({
        "transaction_id": transaction_id,
        "status": status,
        "amount": amount,
        "currency": "USD",
        "billing": { "email": email, "first_name": "Ana", "last_name": "Lima" }
    })
}

async fn payment_count(pool: &PgPool, transaction_id: &str) -> i64 {
    PaymentRepo::count_by_transaction_id(pool, transaction_id)
        .await
        .unwrap()
}

/// The audit write is fire-and-forget, so poll for it.
async fn wait_for_audit_rows(pool: &PgPool, transaction_id: &str, expected: usize) -> usize {
    for _ in 0..50 {
        let rows = WebhookLogRepo::list_for_transaction(pool, transaction_id)
            .await
            .unwrap();
        if rows.len() >= expected {
            return rows.len();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    WebhookLogRepo::list_for_transaction(pool, transaction_id)
        .await
        .unwrap()
        .len()
}

// ---------------------------------------------------------------------------
// Successful payments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn approved_payment_activates_matching_plan(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let user_id = user_with_email(&app, &pool, "5558000", "Ana@Example.com").await;

    let response = post_json(
        app.clone(),
        WEBHOOK,
        delivery("txn_pro_1", "APPROVED", json!(79), "ana@example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Payment processed successfully");

    let payment = PaymentRepo::find_by_transaction_id(&pool, "txn_pro_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "completed");
    assert_eq!(payment.provider_status, "APPROVED");
    assert_eq!(payment.plan_id, "pro");
    assert_eq!(payment.user_id, Some(user_id));
    assert_eq!(payment.payer_name.as_deref(), Some("Ana Lima"));

    let plan = UserPlanRepo::find_by_user(&pool, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.plan_id, "pro");
    assert_eq!(plan.transaction_id, "txn_pro_1");
    assert_eq!(plan.status, "active");

    let response = get(app, &format!("/api/v1/users/{user_id}/plan")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["plan_id"], "pro");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_delivery_is_acknowledged_once(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    user_with_email(&app, &pool, "5558001", "dup@example.com").await;
    let body = delivery("txn_dup", "success", json!("149.00"), "dup@example.com");

    let first = post_json(app.clone(), WEBHOOK, body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_json(app, WEBHOOK, body).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(second).await["message"], "Already processed");

    assert_eq!(payment_count(&pool, "txn_dup").await, 1);
    assert_eq!(wait_for_audit_rows(&pool, "txn_dup", 2).await, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn later_payment_replaces_current_plan(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let user_id = user_with_email(&app, &pool, "5558002", "up@example.com").await;

    post_json(
        app.clone(),
        WEBHOOK,
        delivery("txn_a", "completed", json!(29), "up@example.com"),
    )
    .await;
    post_json(
        app,
        WEBHOOK,
        delivery("txn_b", "completed", json!(149), "up@example.com"),
    )
    .await;

    let plan = UserPlanRepo::find_by_user(&pool, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.plan_id, "premium");
    assert_eq!(plan.transaction_id, "txn_b");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_payer_is_recorded_without_plan(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        WEBHOOK,
        delivery("txn_orphan", "success", json!(12.5), "nobody@example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let payment = PaymentRepo::find_by_transaction_id(&pool, "txn_orphan")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.user_id, None);
    // Unmatched amounts fall back to the cheapest tier.
    assert_eq!(payment.plan_id, "basic");
}

// ---------------------------------------------------------------------------
// Unsuccessful payments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn declined_payment_is_recorded_without_plan(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let user_id = user_with_email(&app, &pool, "5558003", "no@example.com").await;

    let response = post_json(
        app.clone(),
        WEBHOOK,
        delivery("txn_declined", "declined", json!(79), "no@example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Payment recorded with status failed"
    );

    let payment = PaymentRepo::find_by_transaction_id(&pool, "txn_declined")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "failed");
    assert_eq!(payment.user_id, Some(user_id));
    assert!(UserPlanRepo::find_by_user(&pool, user_id)
        .await
        .unwrap()
        .is_none());

    let response = get(app, &format!("/api/v1/users/{user_id}/plan")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refund_with_negative_amount_is_recorded_as_failed(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let user_id = user_with_email(&app, &pool, "5558005", "refund@example.com").await;

    let response = post_json(
        app,
        WEBHOOK,
        delivery("txn_refund", "refunded", json!(-29.0), "refund@example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Payment recorded with status failed"
    );

    let payment = PaymentRepo::find_by_transaction_id(&pool, "txn_refund")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "failed");
    assert_eq!(payment.provider_status, "refunded");
    assert_eq!(payment.amount, -29.0);
    assert_eq!(payment.plan_id, "basic");
    assert_eq!(payment.user_id, Some(user_id));
    assert!(UserPlanRepo::find_by_user(&pool, user_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payer_email_is_stored_as_submitted(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let user_id = user_with_email(&app, &pool, "5558006", "ana.lima@example.com").await;

    let response = post_json(
        app,
        WEBHOOK,
        delivery("txn_case", "approved", json!(79), "  Ana.Lima@Example.COM "),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let payment = PaymentRepo::find_by_transaction_id(&pool, "txn_case")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.payer_email, "Ana.Lima@Example.COM");
    // The user is still matched case-insensitively.
    assert_eq!(payment.user_id, Some(user_id));
    assert!(UserPlanRepo::find_by_user(&pool, user_id)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn success_after_failure_for_same_transaction_is_duplicate(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let user_id = user_with_email(&app, &pool, "5558004", "retry@example.com").await;

    post_json(
        app.clone(),
        WEBHOOK,
        delivery("txn_flip", "pending", json!(79), "retry@example.com"),
    )
    .await;
    let response = post_json(
        app,
        WEBHOOK,
        delivery("txn_flip", "approved", json!(79), "retry@example.com"),
    )
    .await;
    assert_eq!(body_json(response).await["message"], "Already processed");

    let payment = PaymentRepo::find_by_transaction_id(&pool, "txn_flip")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "pending");
    assert!(UserPlanRepo::find_by_user(&pool, user_id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Malformed deliveries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_fields_are_rejected_but_audited(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        WEBHOOK,
        json!({ "transaction_id": "txn_no_email", "status": "success", "amount": 29 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("email"));

    assert_eq!(payment_count(&pool, "txn_no_email").await, 0);
    assert_eq!(wait_for_audit_rows(&pool, "txn_no_email", 1).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_json_body_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_raw(app, WEBHOOK, "text/plain", "transaction_id=1&status=ok").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);

    let mut logged = 0;
    for _ in 0..50 {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM webhook_logs WHERE payload = to_jsonb($1::text)",
        )
        .bind("transaction_id=1&status=ok")
        .fetch_one(&pool)
        .await
        .unwrap();
        if count > 0 {
            logged = count;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(logged, 1);
}

// ---------------------------------------------------------------------------
// Ledger lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_lookup_hides_raw_payload(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    post_json(
        app.clone(),
        WEBHOOK,
        delivery("txn_lookup", "success", json!(29), "look@example.com"),
    )
    .await;

    let response = get(app.clone(), "/api/v1/payments/txn_lookup").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["transaction_id"], "txn_lookup");
    assert_eq!(json["data"]["amount"], 29.0);
    assert!(json["data"].get("raw_payload").is_none());

    let response = get(app, "/api/v1/payments/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Reconciler without HTTP
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn reconciler_reports_outcomes(pool: PgPool) {
    let reconciler = PaymentReconciler::new(pool.clone(), Arc::new(PlanCatalog::default()));

    let outcome = reconciler
        .reconcile(delivery("txn_direct", "success", json!(79), "direct@example.com"))
        .await
        .unwrap();
    assert_matches!(
        outcome,
        ReconcileOutcome::Processed { ref payment, user_plan: None } if payment.plan_id == "pro"
    );

    let outcome = reconciler
        .reconcile(delivery("txn_direct", "success", json!(79), "direct@example.com"))
        .await
        .unwrap();
    assert_matches!(outcome, ReconcileOutcome::AlreadyProcessed);

    let outcome = reconciler
        .reconcile(delivery("txn_direct_2", "pending", json!(79), "direct@example.com"))
        .await
        .unwrap();
    assert_matches!(outcome, ReconcileOutcome::Recorded { ref payment } if payment.status == "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_success_deliveries_insert_once(pool: PgPool) {
    let reconciler = Arc::new(PaymentReconciler::new(
        pool.clone(),
        Arc::new(PlanCatalog::default()),
    ));
    let body = delivery("txn_race", "success", json!(29), "race@example.com");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reconciler = reconciler.clone();
            let body = body.clone();
            tokio::spawn(async move { reconciler.reconcile(body).await })
        })
        .collect();

    let mut processed = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ReconcileOutcome::Processed { .. } => processed += 1,
            ReconcileOutcome::AlreadyProcessed => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(processed, 1);
    assert_eq!(payment_count(&pool, "txn_race").await, 1);
}
