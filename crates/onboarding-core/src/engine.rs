//! `OnboardingEngine`: the entry point presentation layers call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use onboarding_state::{
    ActionPlanService, Answer, AssignmentId, AssignmentStore, Collaborator,
    CollaboratorDirectory, CollaboratorId, EvaluationAssignment, Milestone, MilestoneResult,
    MilestoneResultStore, TemplateCatalog, UserId,
};
use serde::Serialize;
use tracing::{info, instrument, Instrument};

use crate::action_plans::ActionPlanAutoAssigner;
use crate::advancement::NextMilestoneAdvancer;
use crate::aggregation::{AggregationOutcome, MilestoneResultAggregator};
use crate::assignment::{AssignmentOrchestrator, MilestoneAssignments};
use crate::cascade::{CascadeCoordinator, CascadeReport, StepOutcome};
use crate::config::EngineConfig;
use crate::domain::{OnboardingError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::submission::SubmissionProcessor;

/// Every port the engine talks through.
#[derive(Clone)]
pub struct EnginePorts {
    pub collaborators: Arc<dyn CollaboratorDirectory>,
    pub templates: Arc<dyn TemplateCatalog>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub results: Arc<dyn MilestoneResultStore>,
    pub action_plans: Arc<dyn ActionPlanService>,
}

/// A completed assignment and what its cascade did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    pub assignment: EvaluationAssignment,
    pub cascade: CascadeReport,
}

/// Narrows [`OnboardingEngine::pending_evaluations`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingFilter {
    pub collaborator: Option<CollaboratorId>,
    pub milestone: Option<Milestone>,
}

impl PendingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_collaborator(collaborator: CollaboratorId) -> Self {
        Self {
            collaborator: Some(collaborator),
            milestone: None,
        }
    }

    pub fn with_milestone(mut self, milestone: Milestone) -> Self {
        self.milestone = Some(milestone);
        self
    }
}

/// What replay did for one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStep {
    pub milestone: Milestone,
    pub aggregation: StepOutcome,
    pub advancement: StepOutcome,
}

/// Evaluation lifecycle facade.
#[derive(Clone)]
pub struct OnboardingEngine {
    ports: EnginePorts,
    config: EngineConfig,
    orchestrator: AssignmentOrchestrator,
    processor: SubmissionProcessor,
    aggregator: MilestoneResultAggregator,
    coordinator: CascadeCoordinator,
}

impl OnboardingEngine {
    pub fn new(ports: EnginePorts, config: EngineConfig) -> Self {
        let orchestrator = AssignmentOrchestrator::new(
            ports.collaborators.clone(),
            ports.templates.clone(),
            ports.assignments.clone(),
            config.dedup_policy,
        );
        let processor = SubmissionProcessor::new(ports.assignments.clone(), ports.templates.clone());
        let aggregator = MilestoneResultAggregator::new(
            ports.assignments.clone(),
            ports.templates.clone(),
            ports.results.clone(),
        );
        let coordinator = CascadeCoordinator::new(
            ports.collaborators.clone(),
            ports.assignments.clone(),
            ports.templates.clone(),
            aggregator.clone(),
            ActionPlanAutoAssigner::new(ports.action_plans.clone(), config.action_plan_horizon_days),
            NextMilestoneAdvancer::new(ports.assignments.clone(), orchestrator.clone()),
            config.risk_policy,
        );

        Self {
            ports,
            config,
            orchestrator,
            processor,
            aggregator,
            coordinator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn collaborator(&self, id: CollaboratorId) -> Result<Collaborator> {
        self.ports
            .collaborators
            .find_by_id(id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("collaborator", id))
    }

    /// Create the assignments `milestone` requires for a collaborator.
    pub async fn assign_evaluation(
        &self,
        collaborator_id: CollaboratorId,
        milestone: Milestone,
    ) -> Result<MilestoneAssignments> {
        self.assign_evaluation_at(collaborator_id, milestone, Utc::now())
            .await
    }

    #[instrument(skip(self, now), fields(collaborator = %collaborator_id, milestone = %milestone))]
    pub async fn assign_evaluation_at(
        &self,
        collaborator_id: CollaboratorId,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> Result<MilestoneAssignments> {
        self.orchestrator.assign(collaborator_id, milestone, now).await
    }

    /// Move a pending assignment to in-progress.
    pub async fn start_assignment(&self, id: AssignmentId) -> Result<EvaluationAssignment> {
        self.processor.start(id, Utc::now()).await
    }

    pub async fn start_assignment_at(
        &self,
        id: AssignmentId,
        now: DateTime<Utc>,
    ) -> Result<EvaluationAssignment> {
        self.processor.start(id, now).await
    }

    /// Complete an assignment and run its cascade.
    pub async fn submit(
        &self,
        id: AssignmentId,
        answers: Vec<Answer>,
        submitted_by: Option<UserId>,
    ) -> Result<SubmissionOutcome> {
        self.submit_at(id, answers, submitted_by, Utc::now()).await
    }

    /// [`OnboardingEngine::submit`] with an explicit clock.
    ///
    /// Errors only come from the completion itself. Once the assignment is
    /// stored as completed the call succeeds; cascade trouble shows up in
    /// the report.
    #[instrument(skip(self, answers, submitted_by, now), fields(assignment_id = %id))]
    pub async fn submit_at(
        &self,
        id: AssignmentId,
        answers: Vec<Answer>,
        submitted_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let assignment = self.processor.complete(id, answers, submitted_by, now).await?;
        obs::emit_submission_completed(&assignment);
        METRICS.inc_submissions_completed();

        let cascade = self
            .coordinator
            .run(&assignment, now)
            .instrument(obs::collaborator_span(assignment.collaborator_id))
            .await;
        Ok(SubmissionOutcome {
            assignment,
            cascade,
        })
    }

    /// Open (`PENDING` or `IN_PROGRESS`) assignments, oldest first.
    pub async fn pending_evaluations(
        &self,
        filter: PendingFilter,
    ) -> Result<Vec<EvaluationAssignment>> {
        let internal = match filter.collaborator {
            Some(id) => Some(self.collaborator(id).await?.internal_id),
            None => None,
        };

        let pending = self.ports.assignments.find_all_pending().await?;
        Ok(pending
            .into_iter()
            .filter(|a| internal.map_or(true, |id| a.collaborator_id == id))
            .filter(|a| filter.milestone.map_or(true, |m| a.milestone == m))
            .collect())
    }

    /// Consolidated results of a collaborator, in milestone order.
    pub async fn milestone_results(
        &self,
        collaborator_id: CollaboratorId,
    ) -> Result<Vec<MilestoneResult>> {
        let collaborator = self.collaborator(collaborator_id).await?;
        Ok(self
            .ports
            .results
            .find_by_collaborator(collaborator.internal_id)
            .await?)
    }

    /// Run aggregation for one milestone on demand.
    pub async fn aggregate(
        &self,
        collaborator_id: CollaboratorId,
        milestone: Milestone,
    ) -> Result<AggregationOutcome> {
        self.aggregate_at(collaborator_id, milestone, Utc::now()).await
    }

    #[instrument(skip(self, now), fields(collaborator = %collaborator_id, milestone = %milestone))]
    pub async fn aggregate_at(
        &self,
        collaborator_id: CollaboratorId,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> Result<AggregationOutcome> {
        let collaborator = self.collaborator(collaborator_id).await?;
        self.aggregator
            .aggregate(collaborator.internal_id, milestone, now)
            .await
    }

    /// Re-run aggregation and advancement for every milestone, in order.
    ///
    /// Repairs a cascade that was interrupted after the completion write.
    /// Safe to run any number of times.
    pub async fn replay(&self, collaborator_id: CollaboratorId) -> Result<Vec<ReplayStep>> {
        self.replay_at(collaborator_id, Utc::now()).await
    }

    #[instrument(skip(self, now), fields(collaborator = %collaborator_id))]
    pub async fn replay_at(
        &self,
        collaborator_id: CollaboratorId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReplayStep>> {
        let collaborator = self.collaborator(collaborator_id).await?;
        let span = obs::collaborator_span(collaborator.internal_id);

        let mut steps = Vec::with_capacity(Milestone::ALL.len());
        for milestone in Milestone::ALL {
            let aggregation = self
                .coordinator
                .aggregation_step(collaborator.internal_id, milestone, now)
                .instrument(span.clone())
                .await;
            let advancement = self
                .coordinator
                .advancement_step(Some(&collaborator), milestone, now)
                .instrument(span.clone())
                .await;
            steps.push(ReplayStep {
                milestone,
                aggregation,
                advancement,
            });
        }

        info!(
            event = "replay.finished",
            milestones = steps.len(),
            failed = steps
                .iter()
                .filter(|s| s.aggregation.is_failed() || s.advancement.is_failed())
                .count(),
        );
        Ok(steps)
    }
}
