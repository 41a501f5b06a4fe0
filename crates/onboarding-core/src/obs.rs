//! Structured observability hooks for onboarding lifecycle events.
//!
//! This module provides:
//! - A collaborator-scoped tracing span for cascade and replay work
//! - Emission functions for key lifecycle events: assignment creation,
//!   submission, cascade steps, result recording and action-plan creation
//!
//! Events are emitted at `info!` level except failed cascade steps, which are
//! `warn!`. Use `RUST_LOG` to filter and `--json` on the CLI for JSON lines.

use onboarding_state::{
    ActionPlan, AssignmentId, EvaluationAssignment, InternalId, Milestone, MilestoneResult,
    RiskLevel,
};
use tracing::{info, warn};

use crate::cascade::{CascadeStep, StepOutcome};

/// Span tagged with the collaborator's internal id.
///
/// Attach it to futures with `tracing::Instrument::instrument`; holding an
/// entered span across `.await` mis-attributes events from other tasks.
pub fn collaborator_span(collaborator: InternalId) -> tracing::Span {
    tracing::info_span!("onboarding.collaborator", collaborator_id = collaborator.0)
}

/// Emit event: assignments created for a milestone.
pub fn emit_assignment_created(assignment: &EvaluationAssignment) {
    info!(
        event = "assignment.created",
        assignment_id = %assignment.id,
        collaborator_id = assignment.collaborator_id.0,
        template_id = %assignment.template_id,
        milestone = %assignment.milestone,
        due_date = %assignment.due_date,
    );
}

/// Emit event: an assignment was completed with its individual score.
pub fn emit_submission_completed(assignment: &EvaluationAssignment) {
    info!(
        event = "submission.completed",
        assignment_id = %assignment.id,
        collaborator_id = assignment.collaborator_id.0,
        milestone = %assignment.milestone,
        score = assignment.score.unwrap_or_default(),
    );
}

/// Emit event: one cascade step finished. Failures are warnings.
pub fn emit_cascade_step(assignment_id: AssignmentId, step: CascadeStep, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Completed { detail } => info!(
            event = "cascade.step",
            assignment_id = %assignment_id,
            step = step.as_str(),
            outcome = "completed",
            detail = %detail,
        ),
        StepOutcome::Skipped { reason } => info!(
            event = "cascade.step",
            assignment_id = %assignment_id,
            step = step.as_str(),
            outcome = "skipped",
            reason = %reason,
        ),
        StepOutcome::Failed { reason } => warn!(
            event = "cascade.step_failed",
            assignment_id = %assignment_id,
            step = step.as_str(),
            outcome = "failed",
            error = %reason,
            "cascade step failed"
        ),
    }
}

/// Emit event: a consolidated milestone result was persisted.
pub fn emit_result_recorded(result: &MilestoneResult) {
    info!(
        event = "result.recorded",
        result_id = %result.id,
        collaborator_id = result.collaborator_id.0,
        milestone = %result.milestone,
        final_score = result.final_score,
        risk_level = %result.risk_level,
        formula = %result.calculation_formula,
    );
}

/// Emit event: an action plan was opened for an at-risk collaborator.
pub fn emit_action_plan_created(plan: &ActionPlan, milestone: Milestone, risk: RiskLevel) {
    info!(
        event = "action_plan.created",
        plan_id = %plan.id,
        collaborator = %plan.collaborator_id,
        plan_type = %plan.plan_type,
        milestone = %milestone,
        risk_level = %risk,
        due_date = %plan.due_date,
    );
}
