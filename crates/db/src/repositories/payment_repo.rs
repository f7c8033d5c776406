//! Repository for the `payments` ledger.
//!
//! Rows are insert-only. Both insert paths use
//! `ON CONFLICT (transaction_id) DO NOTHING`, so a repeated delivery yields
//! `None` instead of a second row.

use sqlx::PgPool;

use crate::models::payment::{CreatePayment, Payment};

/// Column list for `payments` queries.
const COLUMNS: &str = "\
    id, user_id, transaction_id, payer_email, payer_name, plan_id, amount, \
    currency, status, provider_status, raw_payload, paid_at, created_at";

const INSERT_IF_ABSENT: &str = "\
    INSERT INTO payments \
        (user_id, transaction_id, payer_email, payer_name, plan_id, amount, \
         currency, status, provider_status, raw_payload) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
    ON CONFLICT (transaction_id) DO NOTHING";

pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn find_by_transaction_id(
        pool: &PgPool,
        transaction_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE transaction_id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(transaction_id)
            .fetch_optional(pool)
            .await
    }

    /// Same as [`Self::find_by_transaction_id`], inside a transaction.
    pub async fn find_by_transaction_id_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        transaction_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE transaction_id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(transaction_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Insert a payment unless one exists for the transaction id.
    pub async fn insert_if_absent(
        pool: &PgPool,
        input: &CreatePayment,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("{INSERT_IF_ABSENT} RETURNING {COLUMNS}");
        bind_create(sqlx::query_as::<_, Payment>(&query), input)
            .fetch_optional(pool)
            .await
    }

    /// Transactional variant of [`Self::insert_if_absent`].
    pub async fn insert_if_absent_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreatePayment,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("{INSERT_IF_ABSENT} RETURNING {COLUMNS}");
        bind_create(sqlx::query_as::<_, Payment>(&query), input)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn count_by_transaction_id(
        pool: &PgPool,
        transaction_id: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM payments WHERE transaction_id = $1")
                .bind(transaction_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

type PaymentQuery<'q> =
    sqlx::query::QueryAs<'q, sqlx::Postgres, Payment, sqlx::postgres::PgArguments>;

fn bind_create<'q>(query: PaymentQuery<'q>, input: &'q CreatePayment) -> PaymentQuery<'q> {
    query
        .bind(input.user_id)
        .bind(&input.transaction_id)
        .bind(&input.payer_email)
        .bind(&input.payer_name)
        .bind(&input.plan_id)
        .bind(input.amount)
        .bind(&input.currency)
        .bind(&input.status)
        .bind(&input.provider_status)
        .bind(&input.raw_payload)
}
