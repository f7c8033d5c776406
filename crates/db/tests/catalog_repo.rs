//! Integration tests for interest selection and introduction answers.

use chrono::{Duration, Utc};
use linkup_db::models::introduction::UpsertAnswer;
use linkup_db::models::user::CreateUser;
use linkup_db::repositories::{
    InterestRepo, IntroductionAnswerRepo, OnboardingQuestionRepo, UserRepo,
};
use sqlx::PgPool;

async fn seed_user(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            phone_number: "5559999".to_string(),
            country_code: "+44".to_string(),
            otp_code: "123456".to_string(),
            otp_expires_at: Utc::now() + Duration::minutes(5),
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_interests_drops_unknown_and_inactive(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let catalog = InterestRepo::list_active(&pool).await.unwrap();
    let (keep, retired) = (catalog[0].id, catalog[1].id);

    sqlx::query("UPDATE interests SET is_active = FALSE WHERE id = $1")
        .bind(retired)
        .execute(&pool)
        .await
        .unwrap();

    let stored = InterestRepo::replace_for_user(&pool, user_id, &[keep, retired, 987_654])
        .await
        .unwrap();

    assert_eq!(stored, vec![keep]);
    assert_eq!(InterestRepo::count_for_user(&pool, user_id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_interests_is_not_additive(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let catalog = InterestRepo::list_active(&pool).await.unwrap();

    InterestRepo::replace_for_user(&pool, user_id, &[catalog[0].id, catalog[1].id])
        .await
        .unwrap();
    InterestRepo::replace_for_user(&pool, user_id, &[catalog[2].id])
        .await
        .unwrap();

    let selected = InterestRepo::list_for_user(&pool, user_id).await.unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, catalog[2].id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_answers_upsert_one_row_per_question(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let questions = OnboardingQuestionRepo::list_active(&pool).await.unwrap();
    let question_id = questions[0].id;

    IntroductionAnswerRepo::upsert_many(
        &pool,
        user_id,
        &[UpsertAnswer {
            question_id,
            answer: Some("first".to_string()),
        }],
    )
    .await
    .unwrap();
    IntroductionAnswerRepo::upsert_many(
        &pool,
        user_id,
        &[UpsertAnswer {
            question_id,
            answer: Some("second".to_string()),
        }],
    )
    .await
    .unwrap();

    let answers = IntroductionAnswerRepo::list_for_user(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].answer.as_deref(), Some("second"));

    IntroductionAnswerRepo::upsert_many(
        &pool,
        user_id,
        &[UpsertAnswer {
            question_id,
            answer: None,
        }],
    )
    .await
    .unwrap();
    assert_eq!(
        IntroductionAnswerRepo::count_answered(&pool, user_id)
            .await
            .unwrap(),
        0
    );
}
