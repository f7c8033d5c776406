//! Repositories for introduction questions and answers.

use linkup_core::types::DbId;
use sqlx::PgPool;

use crate::models::introduction::{IntroductionAnswer, OnboardingQuestion, UpsertAnswer};

/// Column list for `onboarding_questions` queries.
const QUESTION_COLUMNS: &str = "\
    id, question_key, question_text, placeholder, max_length, is_required, \
    sort_order, is_active, created_at, updated_at";

/// Column list for `user_introduction_answers` queries.
const ANSWER_COLUMNS: &str = "id, user_id, question_id, answer, created_at, updated_at";

pub struct OnboardingQuestionRepo;

impl OnboardingQuestionRepo {
    pub async fn list_active(pool: &PgPool) -> Result<Vec<OnboardingQuestion>, sqlx::Error> {
        let query = format!(
            "SELECT {QUESTION_COLUMNS} FROM onboarding_questions \
             WHERE is_active = TRUE ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, OnboardingQuestion>(&query)
            .fetch_all(pool)
            .await
    }
}

pub struct IntroductionAnswerRepo;

impl IntroductionAnswerRepo {
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<IntroductionAnswer>, sqlx::Error> {
        let query = format!(
            "SELECT {ANSWER_COLUMNS} FROM user_introduction_answers \
             WHERE user_id = $1 ORDER BY question_id"
        );
        sqlx::query_as::<_, IntroductionAnswer>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Write all answers in one transaction, one row per (user, question).
    pub async fn upsert_many(
        pool: &PgPool,
        user_id: DbId,
        answers: &[UpsertAnswer],
    ) -> Result<Vec<IntroductionAnswer>, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_introduction_answers (user_id, question_id, answer) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_user_introduction_answers_user_question \
             DO UPDATE SET answer = EXCLUDED.answer \
             RETURNING {ANSWER_COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut saved = Vec::with_capacity(answers.len());
        for answer in answers {
            let row = sqlx::query_as::<_, IntroductionAnswer>(&query)
                .bind(user_id)
                .bind(answer.question_id)
                .bind(&answer.answer)
                .fetch_one(&mut *tx)
                .await?;
            saved.push(row);
        }
        tx.commit().await?;

        Ok(saved)
    }

    /// Number of non-empty answers a user has given.
    pub async fn count_answered(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM user_introduction_answers \
             WHERE user_id = $1 AND answer IS NOT NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
