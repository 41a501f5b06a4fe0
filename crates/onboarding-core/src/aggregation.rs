//! Milestone result consolidation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use onboarding_state::{
    AssignmentStore, EvaluationAssignment, InternalId, Milestone, MilestoneResult,
    MilestoneResultStore, ResultId, TargetRole, TemplateCatalog,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::domain::{OnboardingError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::risk;
use crate::scoring::{assignment_for, RoledAssignment, ScoreCalculatorFactory};

/// What one aggregation attempt did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum AggregationOutcome {
    /// The milestone has no assignments.
    NoAssignments,
    /// Not enough assignments are scored yet.
    NotReady,
    Created(MilestoneResult),
    /// A result was already recorded; it is returned untouched.
    AlreadyExists(MilestoneResult),
}

impl AggregationOutcome {
    pub fn result(&self) -> Option<&MilestoneResult> {
        match self {
            AggregationOutcome::Created(r) | AggregationOutcome::AlreadyExists(r) => Some(r),
            _ => None,
        }
    }
}

/// Attach each assignment's role, looked up through its template.
///
/// Assignments whose template is missing cannot be attributed and are left
/// out.
pub async fn resolve_roles(
    templates: &dyn TemplateCatalog,
    assignments: &[EvaluationAssignment],
) -> Result<Vec<RoledAssignment>> {
    let mut roled = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        match templates.find_by_id(assignment.template_id).await? {
            Some(template) => roled.push(RoledAssignment::new(template.target_role, assignment)),
            None => warn!(
                assignment_id = %assignment.id,
                template_id = %assignment.template_id,
                "template missing, assignment left out of the milestone"
            ),
        }
    }
    Ok(roled)
}

/// Persists the first consolidated result per (collaborator, milestone).
#[derive(Clone)]
pub struct MilestoneResultAggregator {
    assignments: Arc<dyn AssignmentStore>,
    templates: Arc<dyn TemplateCatalog>,
    results: Arc<dyn MilestoneResultStore>,
}

impl MilestoneResultAggregator {
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        templates: Arc<dyn TemplateCatalog>,
        results: Arc<dyn MilestoneResultStore>,
    ) -> Self {
        Self {
            assignments,
            templates,
            results,
        }
    }

    /// Consolidate `milestone` for `collaborator` if its strategy allows.
    ///
    /// Idempotent: an existing result is returned as `AlreadyExists`,
    /// including when a concurrent writer saves first.
    #[instrument(skip(self, now), fields(collaborator_id = collaborator.0, milestone = %milestone))]
    pub async fn aggregate(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> Result<AggregationOutcome> {
        let assignments = self
            .assignments
            .find_by_collaborator_and_milestone(collaborator, milestone)
            .await?;
        if assignments.is_empty() {
            debug!("no assignments to aggregate");
            return Ok(AggregationOutcome::NoAssignments);
        }

        let roled = resolve_roles(self.templates.as_ref(), &assignments).await?;
        let Some(calculation) = ScoreCalculatorFactory::for_milestone(milestone).calculate(&roled)
        else {
            debug!("milestone not ready for consolidation");
            return Ok(AggregationOutcome::NotReady);
        };

        if let Some(existing) = self
            .results
            .find_by_collaborator_and_milestone(collaborator, milestone)
            .await?
        {
            warn!(result_id = %existing.id, "milestone result already recorded");
            return Ok(AggregationOutcome::AlreadyExists(existing));
        }

        let result = MilestoneResult {
            id: ResultId::new(),
            collaborator_id: collaborator,
            milestone,
            collaborator_assignment_id: assignment_for(&roled, TargetRole::Collaborator),
            team_leader_assignment_id: assignment_for(&roled, TargetRole::TeamLeader),
            final_score: calculation.final_score,
            risk_level: risk::classify(calculation.final_score),
            calculation_formula: calculation.formula,
            calculated_at: now,
        };

        match self.results.save(&result).await {
            Ok(()) => {
                obs::emit_result_recorded(&result);
                METRICS.inc_results_recorded();
                Ok(AggregationOutcome::Created(result))
            }
            Err(e) if e.is_conflict() => {
                warn!(error = %e, "milestone result recorded concurrently");
                self.results
                    .find_by_collaborator_and_milestone(collaborator, milestone)
                    .await?
                    .map(AggregationOutcome::AlreadyExists)
                    .ok_or_else(|| OnboardingError::from(e))
            }
            Err(e) => Err(e.into()),
        }
    }
}
