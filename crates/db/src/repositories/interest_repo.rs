//! Repository for the `interests` catalog and `user_interests` selections.

use linkup_core::types::DbId;
use sqlx::PgPool;

use crate::models::interest::Interest;

/// Column list for `interests` queries.
const COLUMNS: &str = "id, name, category, icon, sort_order, is_active, created_at, updated_at";

pub struct InterestRepo;

impl InterestRepo {
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Interest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM interests WHERE is_active = TRUE ORDER BY sort_order, name"
        );
        sqlx::query_as::<_, Interest>(&query).fetch_all(pool).await
    }

    /// Interests currently selected by a user, in catalog order.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Interest>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM interests i \
             JOIN user_interests ui ON ui.interest_id = i.id \
             WHERE ui.user_id = $1 \
             ORDER BY i.sort_order, i.name",
            prefixed_columns("i")
        );
        sqlx::query_as::<_, Interest>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a user's whole selection.
    ///
    /// Ids that are not in the active catalog are dropped silently. Returns
    /// the ids actually stored.
    pub async fn replace_for_user(
        pool: &PgPool,
        user_id: DbId,
        interest_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_interests WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let stored: Vec<(DbId,)> = sqlx::query_as(
            "INSERT INTO user_interests (user_id, interest_id) \
             SELECT $1, id FROM interests WHERE id = ANY($2) AND is_active = TRUE \
             RETURNING interest_id",
        )
        .bind(user_id)
        .bind(interest_ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        if stored.len() < interest_ids.len() {
            tracing::debug!(
                user_id,
                requested = interest_ids.len(),
                stored = stored.len(),
                "Dropped interest ids not in the active catalog"
            );
        }

        Ok(stored.into_iter().map(|(id,)| id).collect())
    }

    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_interests WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
