//! Integration tests for the payment ledger and plan projection.

use linkup_db::models::payment::CreatePayment;
use linkup_db::models::user_plan::ActivatePlan;
use linkup_db::repositories::{PaymentRepo, UserPlanRepo, UserRepo};
use sqlx::PgPool;

fn new_payment(transaction_id: &str, status: &str) -> CreatePayment {
    CreatePayment {
        user_id: None,
        transaction_id: transaction_id.to_string(),
        payer_email: "payer@example.com".to_string(),
        payer_name: None,
        plan_id: "basic".to_string(),
        amount: 29.0,
        currency: "USD".to_string(),
        status: status.to_string(),
        provider_status: status.to_string(),
        raw_payload: serde_json::json!({ "transaction_id": transaction_id }),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_if_absent_ignores_duplicates(pool: PgPool) {
    let first = PaymentRepo::insert_if_absent(&pool, &new_payment("txn_dup", "failed"))
        .await
        .unwrap();
    assert!(first.is_some());

    let second = PaymentRepo::insert_if_absent(&pool, &new_payment("txn_dup", "pending"))
        .await
        .unwrap();
    assert!(second.is_none());

    let stored = PaymentRepo::find_by_transaction_id(&pool, "txn_dup")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "failed");
    assert_eq!(
        PaymentRepo::count_by_transaction_id(&pool, "txn_dup")
            .await
            .unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_activate_plan_overwrites_previous(pool: PgPool) {
    let user = UserRepo::create(
        &pool,
        &linkup_db::models::user::CreateUser {
            phone_number: "5551212".to_string(),
            country_code: "+1".to_string(),
            otp_code: "123456".to_string(),
            otp_expires_at: chrono::Utc::now(),
        },
    )
    .await
    .unwrap();

    let mut tx = pool.begin().await.unwrap();
    UserPlanRepo::activate(
        &mut tx,
        &ActivatePlan {
            user_id: user.id,
            plan_id: "basic".to_string(),
            transaction_id: "txn_a".to_string(),
        },
    )
    .await
    .unwrap();
    UserPlanRepo::activate(
        &mut tx,
        &ActivatePlan {
            user_id: user.id,
            plan_id: "premium".to_string(),
            transaction_id: "txn_b".to_string(),
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let plan = UserPlanRepo::find_by_user(&pool, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.plan_id, "premium");
    assert_eq!(plan.transaction_id, "txn_b");
    assert_eq!(plan.status, "active");

    let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_plans WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows.0, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rolled_back_payment_leaves_no_row(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    PaymentRepo::insert_if_absent_in_tx(&mut tx, &new_payment("txn_rb", "completed"))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert!(PaymentRepo::find_by_transaction_id(&pool, "txn_rb")
        .await
        .unwrap()
        .is_none());
}
