//! Onboarding step vocabulary and input validation.
//!
//! Steps are independent field-level transitions on the user profile. There
//! is no enforced order between them; the mobile client decides which steps
//! to surface. The canonical order in [`OnboardingStep::ALL`] is only used to
//! suggest the next step.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MIN_SEARCH_RADIUS: i32 = 1;
pub const MAX_SEARCH_RADIUS: i32 = 500;

/// Maximum number of interests a user may select.
pub const MAX_INTERESTS: usize = 10;

pub const MIN_BIO_LENGTH: usize = 10;
pub const MAX_BIO_LENGTH: usize = 500;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    PhoneVerification,
    ConnectionType,
    SearchRadius,
    ReferralCode,
    DiscoverySources,
    Interests,
    Introduction,
    IntroductionAnswers,
    Completion,
}

impl OnboardingStep {
    /// Canonical presentation order.
    pub const ALL: [OnboardingStep; 9] = [
        Self::PhoneVerification,
        Self::ConnectionType,
        Self::SearchRadius,
        Self::ReferralCode,
        Self::DiscoverySources,
        Self::Interests,
        Self::Introduction,
        Self::IntroductionAnswers,
        Self::Completion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhoneVerification => "phone_verification",
            Self::ConnectionType => "connection_type",
            Self::SearchRadius => "search_radius",
            Self::ReferralCode => "referral_code",
            Self::DiscoverySources => "discovery_sources",
            Self::Interests => "interests",
            Self::Introduction => "introduction",
            Self::IntroductionAnswers => "introduction_answers",
            Self::Completion => "completion",
        }
    }

    /// Steps a user may legitimately skip; they never block the next-step
    /// suggestion.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::ReferralCode | Self::IntroductionAnswers)
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which steps currently have data on a profile.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingProgress {
    pub completed_steps: Vec<OnboardingStep>,
    /// First non-skippable step without data, if any.
    pub next_step: Option<OnboardingStep>,
    pub onboarding_completed: bool,
}

impl OnboardingProgress {
    /// Build a progress summary from a per-step predicate.
    pub fn from_fn(mut has_data: impl FnMut(OnboardingStep) -> bool) -> Self {
        let completed_steps: Vec<OnboardingStep> = OnboardingStep::ALL
            .into_iter()
            .filter(|s| has_data(*s))
            .collect();
        let next_step = OnboardingStep::ALL
            .into_iter()
            .find(|s| !s.is_skippable() && !completed_steps.contains(s));
        let onboarding_completed = completed_steps.contains(&OnboardingStep::Completion);
        Self {
            completed_steps,
            next_step,
            onboarding_completed,
        }
    }
}

// ---------------------------------------------------------------------------
// Connection type
// ---------------------------------------------------------------------------

/// What kind of connections the user is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Social,
    Dating,
    Both,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::Dating => "dating",
            Self::Both => "both",
        }
    }
}

impl FromStr for ConnectionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "social" => Ok(Self::Social),
            "dating" => Ok(Self::Dating),
            "both" => Ok(Self::Both),
            other => Err(CoreError::Validation(format!(
                "Invalid connection type '{other}'. Must be one of: social, dating, both"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery sources
// ---------------------------------------------------------------------------

/// How the user heard about the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    AppStore,
    GoogleSearch,
    Instagram,
    Tiktok,
    Facebook,
    Friend,
    Event,
    Other,
}

impl DiscoverySource {
    pub const ALL: [DiscoverySource; 8] = [
        Self::AppStore,
        Self::GoogleSearch,
        Self::Instagram,
        Self::Tiktok,
        Self::Facebook,
        Self::Friend,
        Self::Event,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppStore => "app_store",
            Self::GoogleSearch => "google_search",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Facebook => "facebook",
            Self::Friend => "friend",
            Self::Event => "event",
            Self::Other => "other",
        }
    }
}

impl FromStr for DiscoverySource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|d| d.as_str()).collect();
                CoreError::Validation(format!(
                    "Invalid discovery source '{s}'. Must be one of: {valid:?}"
                ))
            })
    }
}

/// Parse discovery source tags, collapsing duplicates in first-seen order.
pub fn parse_discovery_sources(raw: &[String]) -> Result<Vec<DiscoverySource>, CoreError> {
    if raw.is_empty() {
        return Err(CoreError::Validation(
            "At least one discovery source is required".to_string(),
        ));
    }
    if raw.len() > DiscoverySource::ALL.len() {
        return Err(CoreError::Validation(format!(
            "At most {} discovery sources may be given",
            DiscoverySource::ALL.len()
        )));
    }
    let mut sources = Vec::with_capacity(raw.len());
    for tag in raw {
        let source: DiscoverySource = tag.parse()?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    Ok(sources)
}

// ---------------------------------------------------------------------------
// Scalar fields
// ---------------------------------------------------------------------------

pub fn validate_search_radius(radius: i32) -> Result<(), CoreError> {
    if !(MIN_SEARCH_RADIUS..=MAX_SEARCH_RADIUS).contains(&radius) {
        return Err(CoreError::Validation(format!(
            "Search radius must be between {MIN_SEARCH_RADIUS} and {MAX_SEARCH_RADIUS}"
        )));
    }
    Ok(())
}

/// Check the interest selection size and collapse duplicate ids.
///
/// Whether the ids exist in the active catalog is decided by the caller;
/// unknown ids are dropped there, not rejected here.
pub fn validate_interest_ids(ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
    if ids.len() > MAX_INTERESTS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_INTERESTS} interests may be selected"
        )));
    }
    let mut unique = Vec::with_capacity(ids.len());
    for &id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    Ok(unique)
}

/// Trim a bio and check its length in characters.
pub fn validate_bio(bio: &str) -> Result<String, CoreError> {
    let bio = bio.trim();
    let len = bio.chars().count();
    if !(MIN_BIO_LENGTH..=MAX_BIO_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Bio must be between {MIN_BIO_LENGTH} and {MAX_BIO_LENGTH} characters"
        )));
    }
    Ok(bio.to_string())
}

/// Validate a contact email and return it lower-cased.
pub fn validate_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim();
    if !email.validate_email() {
        return Err(CoreError::Validation(format!(
            "Invalid email address '{email}'"
        )));
    }
    Ok(email.to_lowercase())
}

// ---------------------------------------------------------------------------
// Introduction answers
// ---------------------------------------------------------------------------

/// The part of an introduction question that constrains its answer.
#[derive(Debug, Clone)]
pub struct QuestionRule {
    pub key: String,
    pub max_length: i32,
}

/// An answer ready to be stored. `None` clears a previous answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedAnswer {
    pub question_key: String,
    pub answer: Option<String>,
}

/// Match submitted answers against the question catalog.
///
/// Keys not present in `questions` are ignored. Blank or null answers are
/// kept as `None`. Answers are optional regardless of the question's
/// required flag.
pub fn prepare_answers(
    questions: &[QuestionRule],
    answers: &HashMap<String, Option<String>>,
) -> Result<Vec<PreparedAnswer>, CoreError> {
    let mut prepared = Vec::new();
    for question in questions {
        let Some(submitted) = answers.get(&question.key) else {
            continue;
        };
        let answer = submitted
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        if let Some(text) = answer {
            let max = usize::try_from(question.max_length).unwrap_or(0);
            if text.chars().count() > max {
                return Err(CoreError::Validation(format!(
                    "Answer for '{}' must be at most {max} characters",
                    question.key
                )));
            }
        }
        prepared.push(PreparedAnswer {
            question_key: question.key.clone(),
            answer: answer.map(str::to_string),
        });
    }
    Ok(prepared)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
