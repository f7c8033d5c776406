//! Introduction question catalog and per-user answers.

use linkup_core::onboarding::QuestionRule;
use linkup_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `onboarding_questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OnboardingQuestion {
    pub id: DbId,
    pub question_key: String,
    pub question_text: String,
    pub placeholder: Option<String>,
    pub max_length: i32,
    /// Catalog flag only. Answers are accepted as optional either way.
    pub is_required: bool,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OnboardingQuestion {
    pub fn rule(&self) -> QuestionRule {
        QuestionRule {
            key: self.question_key.clone(),
            max_length: self.max_length,
        }
    }
}

/// A row from the `user_introduction_answers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IntroductionAnswer {
    pub id: DbId,
    pub user_id: DbId,
    pub question_id: DbId,
    pub answer: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for writing one answer. `answer: None` clears it.
#[derive(Debug, Clone)]
pub struct UpsertAnswer {
    pub question_id: DbId,
    pub answer: Option<String>,
}
