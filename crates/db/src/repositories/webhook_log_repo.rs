//! Repository for the append-only `webhook_logs` table.

use sqlx::PgPool;

use crate::models::webhook_log::WebhookLog;

/// Column list for `webhook_logs` queries.
const COLUMNS: &str = "id, source, transaction_id, payload, received_at";

pub struct WebhookLogRepo;

impl WebhookLogRepo {
    pub async fn insert(
        pool: &PgPool,
        source: &str,
        transaction_id: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<WebhookLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhook_logs (source, transaction_id, payload) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WebhookLog>(&query)
            .bind(source)
            .bind(transaction_id)
            .bind(payload)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_transaction(
        pool: &PgPool,
        transaction_id: &str,
    ) -> Result<Vec<WebhookLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM webhook_logs WHERE transaction_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, WebhookLog>(&query)
            .bind(transaction_id)
            .fetch_all(pool)
            .await
    }
}
