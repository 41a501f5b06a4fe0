//! Answer validation and assignment completion.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use onboarding_state::{
    Answer, AssignmentId, AssignmentStatus, AssignmentStore, EvaluationAssignment,
    EvaluationTemplate, QuestionType, TemplateCatalog, UserId,
};
use tracing::{debug, instrument};

use crate::domain::{OnboardingError, Result, ValidationIssue};
use crate::scoring::individual_score;

/// Lowest and highest accepted value of a `SCALE_1_4` answer.
pub const SCALE_MIN: f64 = 1.0;
pub const SCALE_MAX: f64 = 4.0;

/// Check `answers` against `template`, collecting every issue.
///
/// - each answer must reference a question of the template
/// - a question may be answered at most once
/// - `SCALE_1_4` answers must be numbers in `[1, 4]`
/// - every required question must be answered
pub fn validate_answers(template: &EvaluationTemplate, answers: &[Answer]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut answered = HashSet::new();
    let mut duplicated = HashSet::new();

    for answer in answers {
        let Some(question) = template.question(answer.question_id) else {
            issues.push(ValidationIssue::UnknownQuestion {
                question_id: answer.question_id,
            });
            continue;
        };
        if !answered.insert(question.id) {
            // One issue per question, however many repeats.
            if duplicated.insert(question.id) {
                issues.push(ValidationIssue::DuplicateAnswer {
                    question_id: question.id,
                });
            }
            continue;
        }
        if question.question_type != QuestionType::Scale1To4 {
            continue;
        }
        match answer.value.as_number() {
            None => issues.push(ValidationIssue::NotNumeric {
                question_id: question.id,
            }),
            Some(value) if !(SCALE_MIN..=SCALE_MAX).contains(&value) => {
                issues.push(ValidationIssue::OutOfRange {
                    question_id: question.id,
                    value,
                })
            }
            Some(_) => {}
        }
    }

    issues.extend(
        template
            .questions
            .iter()
            .filter(|q| q.required && !answered.contains(&q.id))
            .map(|q| ValidationIssue::MissingRequired { question_id: q.id }),
    );

    issues
}

/// Validates and records answers for one assignment.
#[derive(Clone)]
pub struct SubmissionProcessor {
    assignments: Arc<dyn AssignmentStore>,
    templates: Arc<dyn TemplateCatalog>,
}

impl SubmissionProcessor {
    pub fn new(assignments: Arc<dyn AssignmentStore>, templates: Arc<dyn TemplateCatalog>) -> Self {
        Self {
            assignments,
            templates,
        }
    }

    async fn load(&self, id: AssignmentId) -> Result<EvaluationAssignment> {
        self.assignments
            .find_by_id(id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("assignment", id))
    }

    /// `PENDING → IN_PROGRESS`.
    #[instrument(skip(self, now), fields(assignment_id = %id))]
    pub async fn start(&self, id: AssignmentId, now: DateTime<Utc>) -> Result<EvaluationAssignment> {
        let assignment = self.load(id).await?;
        if !assignment
            .status
            .can_transition_to(AssignmentStatus::InProgress)
        {
            return Err(OnboardingError::Conflict(format!(
                "assignment {id} is {} and cannot be started",
                assignment.status
            )));
        }

        let started = assignment.start(now);
        self.assignments.save(&started).await?;
        debug!("assignment started");
        Ok(started)
    }

    /// Validate, score and complete an assignment.
    ///
    /// Nothing is written unless validation passes. The completed assignment
    /// is persisted before it is returned.
    #[instrument(skip(self, answers, now), fields(assignment_id = %id, answers = answers.len()))]
    pub async fn complete(
        &self,
        id: AssignmentId,
        answers: Vec<Answer>,
        submitted_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<EvaluationAssignment> {
        let assignment = self.load(id).await?;
        if !assignment
            .status
            .can_transition_to(AssignmentStatus::Completed)
        {
            return Err(OnboardingError::Conflict(format!(
                "assignment {id} is already completed"
            )));
        }

        let template = self
            .templates
            .find_by_id(assignment.template_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("template", assignment.template_id))?;

        let issues = validate_answers(&template, &answers);
        if !issues.is_empty() {
            return Err(OnboardingError::Validation(issues));
        }

        let score = individual_score(&answers, &template);
        let completed = assignment.complete(answers, score, submitted_by, now);
        self.assignments.save(&completed).await?;
        debug!(score, "assignment completed");
        Ok(completed)
    }
}
