//! Score calculation.
//!
//! Two levels of scoring:
//! - [`individual_score`]: one assignment's score, the mean of its 1–4 scale
//!   answers rounded to one decimal.
//! - [`ScoreStrategy`]: one milestone's consolidated score, computed from the
//!   role-resolved assignments of that milestone. Strategies are stateless and
//!   selected by [`ScoreCalculatorFactory::for_milestone`].

mod strategies;

pub use strategies::{
    weighted_score, Day1Strategy, Month1Strategy, Week1Strategy, COLLABORATOR_WEIGHT,
    TEAM_LEADER_WEIGHT,
};

use onboarding_state::{
    Answer, AssignmentId, EvaluationAssignment, EvaluationTemplate, Milestone, QuestionType,
    TargetRole,
};

/// Round half away from zero to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of the numeric answers to `SCALE_1_4` questions, rounded to one
/// decimal. Open-text answers are ignored; no scale answers yields `0.0`.
///
/// Answers are assumed validated against `template`.
pub fn individual_score(answers: &[Answer], template: &EvaluationTemplate) -> f64 {
    let values: Vec<f64> = answers
        .iter()
        .filter(|answer| {
            template
                .question(answer.question_id)
                .is_some_and(|q| q.question_type == QuestionType::Scale1To4)
        })
        .filter_map(|answer| answer.value.as_number())
        .collect();

    if values.is_empty() {
        return 0.0;
    }
    round_one_decimal(values.iter().sum::<f64>() / values.len() as f64)
}

/// An assignment together with the role its template targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoledAssignment {
    pub role: TargetRole,
    pub assignment_id: AssignmentId,
    /// `Some` only when the assignment is completed.
    pub score: Option<f64>,
}

impl RoledAssignment {
    pub fn new(role: TargetRole, assignment: &EvaluationAssignment) -> Self {
        Self {
            role,
            assignment_id: assignment.id,
            score: assignment.score.filter(|_| assignment.is_scored()),
        }
    }

    pub fn scored(role: TargetRole, score: f64) -> Self {
        Self {
            role,
            assignment_id: AssignmentId::new(),
            score: Some(score),
        }
    }

    pub fn unscored(role: TargetRole) -> Self {
        Self {
            role,
            assignment_id: AssignmentId::new(),
            score: None,
        }
    }
}

/// First scored assignment answered by `role`.
pub fn scored_for(assignments: &[RoledAssignment], role: TargetRole) -> Option<f64> {
    assignments
        .iter()
        .filter(|a| a.role == role)
        .find_map(|a| a.score)
}

/// First assignment (scored or not) answered by `role`.
pub fn assignment_for(assignments: &[RoledAssignment], role: TargetRole) -> Option<AssignmentId> {
    assignments
        .iter()
        .find(|a| a.role == role)
        .map(|a| a.assignment_id)
}

/// Consolidated score of one milestone.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub final_score: f64,
    /// Human-readable derivation, e.g. `(2.0 × 0.4) + (4.0 × 0.6) = 3.2`.
    pub formula: String,
}

/// Per-milestone consolidation rule.
pub trait ScoreStrategy: Send + Sync {
    fn milestone(&self) -> Milestone;

    /// Whether enough assignments are scored to consolidate.
    fn can_calculate(&self, assignments: &[RoledAssignment]) -> bool;

    /// `None` exactly when [`ScoreStrategy::can_calculate`] is false.
    fn calculate(&self, assignments: &[RoledAssignment]) -> Option<Calculation>;
}

/// Stateless strategy dispatch.
pub struct ScoreCalculatorFactory;

impl ScoreCalculatorFactory {
    pub fn for_milestone(milestone: Milestone) -> &'static dyn ScoreStrategy {
        match milestone {
            Milestone::Day1 => &Day1Strategy,
            Milestone::Week1 => &Week1Strategy,
            Milestone::Month1 => &Month1Strategy,
        }
    }
}
