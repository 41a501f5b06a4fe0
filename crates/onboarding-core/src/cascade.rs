//! Post-completion cascade.
//!
//! After an assignment is completed the coordinator runs four steps in order:
//! risk update, result aggregation, action plan, advancement. Every step
//! yields a [`StepOutcome`]; a failing step is logged and reported, never
//! propagated, and never stops the steps after it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use onboarding_state::{
    AssignmentId, AssignmentStore, Collaborator, CollaboratorDirectory, EvaluationAssignment,
    InternalId, Milestone, RiskLevel, TemplateCatalog,
};
use serde::Serialize;
use tracing::warn;

use crate::action_plans::{ActionPlanAutoAssigner, ActionPlanOutcome};
use crate::advancement::{AdvancementOutcome, NextMilestoneAdvancer};
use crate::aggregation::{resolve_roles, AggregationOutcome, MilestoneResultAggregator};
use crate::config::RiskPolicy;
use crate::domain::Result;
use crate::metrics::METRICS;
use crate::obs;
use crate::risk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    RiskUpdate,
    ResultAggregation,
    ActionPlan,
    Advancement,
}

impl CascadeStep {
    pub const ALL: [CascadeStep; 4] = [
        CascadeStep::RiskUpdate,
        CascadeStep::ResultAggregation,
        CascadeStep::ActionPlan,
        CascadeStep::Advancement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CascadeStep::RiskUpdate => "risk_update",
            CascadeStep::ResultAggregation => "result_aggregation",
            CascadeStep::ActionPlan => "action_plan",
            CascadeStep::Advancement => "advancement",
        }
    }
}

impl std::fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed { detail: String },
    Skipped { reason: String },
    Failed { reason: String },
}

impl StepOutcome {
    pub fn completed(detail: impl Into<String>) -> Self {
        StepOutcome::Completed {
            detail: detail.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl ToString) -> Self {
        StepOutcome::Failed {
            reason: reason.to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: CascadeStep,
    pub outcome: StepOutcome,
}

/// Everything the cascade did for one completed assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeReport {
    pub assignment_id: AssignmentId,
    pub collaborator_id: InternalId,
    pub milestone: Milestone,
    /// Level derived from the submission, when the collaborator was found.
    pub risk_level: Option<RiskLevel>,
    pub steps: Vec<StepReport>,
}

impl CascadeReport {
    pub fn outcome(&self, step: CascadeStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|s| s.step == step)
            .map(|s| &s.outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.outcome.is_failed())
    }

    pub fn failed_steps(&self) -> Vec<CascadeStep> {
        self.steps
            .iter()
            .filter(|s| s.outcome.is_failed())
            .map(|s| s.step)
            .collect()
    }
}

/// Runs the cascade and records one outcome per step.
#[derive(Clone)]
pub struct CascadeCoordinator {
    collaborators: Arc<dyn CollaboratorDirectory>,
    assignments: Arc<dyn AssignmentStore>,
    templates: Arc<dyn TemplateCatalog>,
    aggregator: MilestoneResultAggregator,
    action_plans: ActionPlanAutoAssigner,
    advancer: NextMilestoneAdvancer,
    risk_policy: RiskPolicy,
}

impl CascadeCoordinator {
    pub fn new(
        collaborators: Arc<dyn CollaboratorDirectory>,
        assignments: Arc<dyn AssignmentStore>,
        templates: Arc<dyn TemplateCatalog>,
        aggregator: MilestoneResultAggregator,
        action_plans: ActionPlanAutoAssigner,
        advancer: NextMilestoneAdvancer,
        risk_policy: RiskPolicy,
    ) -> Self {
        Self {
            collaborators,
            assignments,
            templates,
            aggregator,
            action_plans,
            advancer,
            risk_policy,
        }
    }

    /// Run every step for a freshly completed assignment.
    pub async fn run(&self, completed: &EvaluationAssignment, now: DateTime<Utc>) -> CascadeReport {
        let mut report = CascadeReport {
            assignment_id: completed.id,
            collaborator_id: completed.collaborator_id,
            milestone: completed.milestone,
            risk_level: None,
            steps: Vec::with_capacity(CascadeStep::ALL.len()),
        };

        // Risk update
        let (collaborator, risk, outcome) = self.risk_update_step(completed, now).await;
        report.risk_level = risk.map(|(level, _)| level);
        self.record(&mut report, CascadeStep::RiskUpdate, outcome);

        // Result aggregation
        let outcome = self
            .aggregation_step(completed.collaborator_id, completed.milestone, now)
            .await;
        self.record(&mut report, CascadeStep::ResultAggregation, outcome);

        // Action plan
        let outcome = match (&collaborator, risk) {
            (Some(collaborator), Some((level, score))) => {
                self.action_plan_step(collaborator, level, completed.milestone, score, now)
                    .await
            }
            _ => StepOutcome::skipped("collaborator not found"),
        };
        self.record(&mut report, CascadeStep::ActionPlan, outcome);

        // Advancement
        let outcome = self
            .advancement_step(collaborator.as_ref(), completed.milestone, now)
            .await;
        self.record(&mut report, CascadeStep::Advancement, outcome);

        report
    }

    fn record(&self, report: &mut CascadeReport, step: CascadeStep, outcome: StepOutcome) {
        obs::emit_cascade_step(report.assignment_id, step, &outcome);
        if outcome.is_failed() {
            METRICS.inc_cascade_steps_failed();
        }
        report.steps.push(StepReport { step, outcome });
    }

    /// Classify and store the collaborator's new risk level.
    ///
    /// Returns the collaborator (when found) and the level with the score it
    /// came from, even if saving the collaborator failed.
    async fn risk_update_step(
        &self,
        completed: &EvaluationAssignment,
        now: DateTime<Utc>,
    ) -> (Option<Collaborator>, Option<(RiskLevel, f64)>, StepOutcome) {
        let mut collaborator = match self
            .collaborators
            .find_by_internal_id(completed.collaborator_id)
            .await
        {
            Ok(Some(collaborator)) => collaborator,
            Ok(None) => return (None, None, StepOutcome::skipped("collaborator not found")),
            Err(e) => return (None, None, StepOutcome::failed(e)),
        };

        let submitted = completed.score.unwrap_or_default();
        let score = match self.policy_score(completed, submitted).await {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "milestone scores unavailable, using the submitted score");
                submitted
            }
        };
        let level = risk::classify(score);

        collaborator.update_risk_level(level, now);
        let outcome = match self.collaborators.save(&collaborator).await {
            Ok(()) => StepOutcome::completed(format!("risk level {level} from score {score:.1}")),
            Err(e) => StepOutcome::failed(e),
        };
        (Some(collaborator), Some((level, score)), outcome)
    }

    async fn policy_score(&self, completed: &EvaluationAssignment, submitted: f64) -> Result<f64> {
        if self.risk_policy == RiskPolicy::LatestEvaluation {
            return Ok(submitted);
        }
        let milestone = self
            .assignments
            .find_by_collaborator_and_milestone(completed.collaborator_id, completed.milestone)
            .await?;
        let roled = resolve_roles(self.templates.as_ref(), &milestone).await?;
        Ok(risk::risk_score(self.risk_policy, submitted, &roled))
    }

    pub(crate) async fn aggregation_step(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> StepOutcome {
        match self.aggregator.aggregate(collaborator, milestone, now).await {
            Ok(AggregationOutcome::Created(result)) => StepOutcome::completed(format!(
                "recorded {milestone} result {:.1} ({})",
                result.final_score, result.risk_level
            )),
            Ok(AggregationOutcome::AlreadyExists(result)) => {
                StepOutcome::skipped(format!("{milestone} result {} already recorded", result.id))
            }
            Ok(AggregationOutcome::NotReady) => {
                StepOutcome::skipped(format!("{milestone} not ready for consolidation"))
            }
            Ok(AggregationOutcome::NoAssignments) => {
                StepOutcome::skipped(format!("{milestone} has no assignments"))
            }
            Err(e) => StepOutcome::failed(e),
        }
    }

    async fn action_plan_step(
        &self,
        collaborator: &Collaborator,
        risk: RiskLevel,
        milestone: Milestone,
        score: f64,
        now: DateTime<Utc>,
    ) -> StepOutcome {
        match self
            .action_plans
            .assign_if_at_risk(collaborator, risk, milestone, score, now)
            .await
        {
            Ok(ActionPlanOutcome::Created(plan)) => {
                StepOutcome::completed(format!("created {} plan {}", plan.plan_type, plan.id))
            }
            Ok(ActionPlanOutcome::AlreadyActive) => {
                StepOutcome::skipped("collaborator already has an active plan")
            }
            Ok(ActionPlanOutcome::NotAtRisk) => {
                StepOutcome::skipped(format!("risk level {risk} needs no plan"))
            }
            Err(e) => StepOutcome::failed(e),
        }
    }

    pub(crate) async fn advancement_step(
        &self,
        collaborator: Option<&Collaborator>,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> StepOutcome {
        let Some(collaborator) = collaborator else {
            return StepOutcome::skipped("collaborator not found");
        };
        match self.advancer.advance(collaborator, milestone, now).await {
            Ok(AdvancementOutcome::Advanced(next)) if next.created.is_empty() => {
                StepOutcome::skipped(format!("no new {} assignments", next.milestone))
            }
            Ok(AdvancementOutcome::Advanced(next)) => StepOutcome::completed(format!(
                "assigned {} ({} created)",
                next.milestone,
                next.created.len()
            )),
            Ok(AdvancementOutcome::Deferred { open }) => {
                StepOutcome::skipped(format!("{open} {milestone} assignments still open"))
            }
            Ok(AdvancementOutcome::NothingAssigned) => {
                StepOutcome::skipped(format!("{milestone} has no assignments"))
            }
            Ok(AdvancementOutcome::Terminal) => {
                StepOutcome::skipped(format!("{milestone} is the last milestone"))
            }
            Err(e) => StepOutcome::failed(e),
        }
    }
}
