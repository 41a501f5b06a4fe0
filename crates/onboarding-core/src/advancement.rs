//! Milestone advancement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use onboarding_state::{AssignmentStore, Collaborator, Milestone};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::assignment::{AssignmentOrchestrator, MilestoneAssignments};
use crate::domain::{milestones, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvancementOutcome {
    /// The milestone has no successor.
    Terminal,
    /// The milestone itself was never assigned.
    NothingAssigned,
    /// Some assignments of the milestone are still open.
    Deferred { open: usize },
    Advanced(MilestoneAssignments),
}

/// Assigns the next milestone once the current one is fully completed.
#[derive(Clone)]
pub struct NextMilestoneAdvancer {
    assignments: Arc<dyn AssignmentStore>,
    orchestrator: AssignmentOrchestrator,
}

impl NextMilestoneAdvancer {
    pub fn new(assignments: Arc<dyn AssignmentStore>, orchestrator: AssignmentOrchestrator) -> Self {
        Self {
            assignments,
            orchestrator,
        }
    }

    #[instrument(
        skip(self, collaborator, now),
        fields(collaborator_id = collaborator.internal_id.0, milestone = %milestone)
    )]
    pub async fn advance(
        &self,
        collaborator: &Collaborator,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> Result<AdvancementOutcome> {
        let Some(next) = milestones::successor(milestone) else {
            return Ok(AdvancementOutcome::Terminal);
        };

        let current = self
            .assignments
            .find_by_collaborator_and_milestone(collaborator.internal_id, milestone)
            .await?;
        if current.is_empty() {
            return Ok(AdvancementOutcome::NothingAssigned);
        }

        let open = current.iter().filter(|a| a.status.is_open()).count();
        if open > 0 {
            debug!(open, "milestone still has open assignments");
            return Ok(AdvancementOutcome::Deferred { open });
        }

        let assigned = self.orchestrator.assign_for(collaborator, next, now).await?;
        debug!(next = %next, created = assigned.created.len(), "advanced to next milestone");
        Ok(AdvancementOutcome::Advanced(assigned))
    }
}
