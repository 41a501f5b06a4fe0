//! Domain-level error taxonomy for the onboarding engine.

use onboarding_state::{QuestionId, StorageError};

/// Why a single answer (or missing answer) was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("question {question_id} is required but has no answer")]
    MissingRequired { question_id: QuestionId },

    #[error("question {question_id} expects a value between 1 and 4, got {value}")]
    OutOfRange { question_id: QuestionId, value: f64 },

    #[error("question {question_id} expects a numeric value")]
    NotNumeric { question_id: QuestionId },

    #[error("question {question_id} is not part of the template")]
    UnknownQuestion { question_id: QuestionId },

    #[error("question {question_id} is answered more than once")]
    DuplicateAnswer { question_id: QuestionId },
}

impl ValidationIssue {
    pub fn question_id(&self) -> QuestionId {
        match self {
            ValidationIssue::MissingRequired { question_id }
            | ValidationIssue::OutOfRange { question_id, .. }
            | ValidationIssue::NotNumeric { question_id }
            | ValidationIssue::UnknownQuestion { question_id }
            | ValidationIssue::DuplicateAnswer { question_id } => *question_id,
        }
    }
}

/// Onboarding engine errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {}", render_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    Storage(StorageError),
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl OnboardingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        OnboardingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Lift port errors into the engine taxonomy: a missing record stays
/// `NotFound`, a rejected write stays `Conflict`.
impl From<StorageError> for OnboardingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => OnboardingError::NotFound { entity, id },
            StorageError::Conflict { entity, detail } => {
                OnboardingError::Conflict(format!("{entity}: {detail}"))
            }
            other => OnboardingError::Storage(other),
        }
    }
}

/// Result type for onboarding engine operations.
pub type Result<T> = std::result::Result<T, OnboardingError>;
