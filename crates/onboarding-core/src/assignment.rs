//! Assignment orchestration: one pending assignment per required role.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use onboarding_state::{
    AssignmentId, AssignmentStore, Collaborator, CollaboratorDirectory, CollaboratorId,
    EvaluationAssignment, Milestone, TargetRole, TemplateCatalog,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::DedupPolicy;
use crate::domain::milestones;
use crate::domain::{OnboardingError, Result};
use crate::metrics::METRICS;
use crate::obs;

/// Why a required role got no new assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoActiveTemplate,
    AlreadyAssigned { assignment_id: AssignmentId },
    /// A concurrent request created the assignment first.
    ConcurrentlyAssigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRole {
    pub role: TargetRole,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of assigning one milestone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneAssignments {
    pub milestone: Milestone,
    /// Every assignment of the milestone, existing and new, in creation order.
    pub assignments: Vec<EvaluationAssignment>,
    /// Ids created by this call.
    pub created: Vec<AssignmentId>,
    pub skipped: Vec<SkippedRole>,
}

/// Creates the assignments a milestone requires.
#[derive(Clone)]
pub struct AssignmentOrchestrator {
    collaborators: Arc<dyn CollaboratorDirectory>,
    templates: Arc<dyn TemplateCatalog>,
    assignments: Arc<dyn AssignmentStore>,
    dedup: DedupPolicy,
}

impl AssignmentOrchestrator {
    pub fn new(
        collaborators: Arc<dyn CollaboratorDirectory>,
        templates: Arc<dyn TemplateCatalog>,
        assignments: Arc<dyn AssignmentStore>,
        dedup: DedupPolicy,
    ) -> Self {
        Self {
            collaborators,
            templates,
            assignments,
            dedup,
        }
    }

    /// Look the collaborator up, then [`AssignmentOrchestrator::assign_for`].
    pub async fn assign(
        &self,
        collaborator_id: CollaboratorId,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> Result<MilestoneAssignments> {
        let collaborator = self
            .collaborators
            .find_by_id(collaborator_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("collaborator", collaborator_id))?;
        self.assign_for(&collaborator, milestone, now).await
    }

    /// Create a pending assignment for every required role of `milestone`
    /// that has an active template and is not yet assigned.
    ///
    /// Missing templates are skipped, not errors.
    #[instrument(
        skip(self, collaborator, now),
        fields(collaborator_id = collaborator.internal_id.0, milestone = %milestone)
    )]
    pub async fn assign_for(
        &self,
        collaborator: &Collaborator,
        milestone: Milestone,
        now: DateTime<Utc>,
    ) -> Result<MilestoneAssignments> {
        let internal = collaborator.internal_id;
        let existing = self
            .assignments
            .find_by_collaborator_and_milestone(internal, milestone)
            .await?;
        let assigned_roles = match self.dedup {
            DedupPolicy::ByTemplate => Vec::new(),
            DedupPolicy::ByRole => self.roles_of(&existing).await?,
        };

        let due_date = milestones::due_date(milestone, collaborator.admission_date).ok_or_else(
            || {
                OnboardingError::Invalid(format!(
                    "{milestone} due date overflows for admission {}",
                    collaborator.admission_date
                ))
            },
        )?;

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        let mut raced = false;

        for &role in milestones::required_roles(milestone) {
            let Some(template) = self
                .templates
                .find_active_by_milestone_and_role(milestone, role)
                .await?
            else {
                warn!(role = %role, "no active template, skipping role");
                skipped.push(SkippedRole {
                    role,
                    reason: SkipReason::NoActiveTemplate,
                });
                continue;
            };

            let already = match self.dedup {
                DedupPolicy::ByTemplate => existing
                    .iter()
                    .find(|a| a.template_id == template.id)
                    .map(|a| a.id),
                DedupPolicy::ByRole => assigned_roles
                    .iter()
                    .find(|(r, _)| *r == role)
                    .map(|(_, id)| *id),
            };
            if let Some(assignment_id) = already {
                debug!(role = %role, assignment_id = %assignment_id, "role already assigned");
                skipped.push(SkippedRole {
                    role,
                    reason: SkipReason::AlreadyAssigned { assignment_id },
                });
                continue;
            }

            let assignment =
                EvaluationAssignment::pending(internal, template.id, milestone, due_date, now);
            match self.assignments.save(&assignment).await {
                Ok(()) => {
                    obs::emit_assignment_created(&assignment);
                    created.push(assignment.id);
                }
                Err(e) if e.is_conflict() => {
                    debug!(role = %role, error = %e, "assignment created concurrently");
                    raced = true;
                    skipped.push(SkippedRole {
                        role,
                        reason: SkipReason::ConcurrentlyAssigned,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        METRICS.inc_assignments_created(created.len() as u64);

        let assignments = if created.is_empty() && !raced {
            existing
        } else {
            self.assignments
                .find_by_collaborator_and_milestone(internal, milestone)
                .await?
        };

        Ok(MilestoneAssignments {
            milestone,
            assignments,
            created,
            skipped,
        })
    }

    /// Role of each assignment, resolved through its template. Assignments
    /// whose template is gone are ignored.
    async fn roles_of(
        &self,
        assignments: &[EvaluationAssignment],
    ) -> Result<Vec<(TargetRole, AssignmentId)>> {
        let mut roles = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if let Some(template) = self.templates.find_by_id(assignment.template_id).await? {
                roles.push((template.target_role, assignment.id));
            }
        }
        Ok(roles)
    }
}
