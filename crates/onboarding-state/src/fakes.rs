//! In-memory fakes for the port traits (testing and demos)
//!
//! Provides `MemoryCollaboratorDirectory`, `MemoryTemplateCatalog`,
//! `MemoryAssignmentStore`, `MemoryMilestoneResultStore` and
//! `MemoryActionPlanService`. Each enforces the same uniqueness guarantees as
//! the trait documentation describes, under a single `Mutex`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::records::*;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryCollaboratorDirectory
// ---------------------------------------------------------------------------

/// In-memory collaborator directory keyed by public id.
#[derive(Debug, Default)]
pub struct MemoryCollaboratorDirectory {
    collaborators: Mutex<HashMap<CollaboratorId, Collaborator>>,
}

impl MemoryCollaboratorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collaborator directly.
    pub fn insert(&self, collaborator: Collaborator) {
        let mut collaborators = self.collaborators.lock().unwrap();
        collaborators.insert(collaborator.id, collaborator);
    }
}

#[async_trait]
impl CollaboratorDirectory for MemoryCollaboratorDirectory {
    async fn find_by_id(&self, id: CollaboratorId) -> StorageResult<Option<Collaborator>> {
        let collaborators = self.collaborators.lock().unwrap();
        Ok(collaborators.get(&id).cloned())
    }

    async fn find_by_internal_id(&self, id: InternalId) -> StorageResult<Option<Collaborator>> {
        let collaborators = self.collaborators.lock().unwrap();
        Ok(collaborators
            .values()
            .find(|c| c.internal_id == id)
            .cloned())
    }

    async fn save(&self, collaborator: &Collaborator) -> StorageResult<()> {
        let mut collaborators = self.collaborators.lock().unwrap();
        collaborators.insert(collaborator.id, collaborator.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryTemplateCatalog
// ---------------------------------------------------------------------------

/// In-memory template catalog.
#[derive(Debug, Default)]
pub struct MemoryTemplateCatalog {
    templates: Mutex<HashMap<TemplateId, EvaluationTemplate>>,
}

impl MemoryTemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, template: EvaluationTemplate) {
        let mut templates = self.templates.lock().unwrap();
        templates.insert(template.id, template);
    }

    /// Mark a template inactive. No-op if absent.
    pub fn deactivate(&self, id: TemplateId) {
        let mut templates = self.templates.lock().unwrap();
        if let Some(template) = templates.get_mut(&id) {
            template.is_active = false;
        }
    }
}

#[async_trait]
impl TemplateCatalog for MemoryTemplateCatalog {
    async fn find_active_by_milestone_and_role(
        &self,
        milestone: Milestone,
        role: TargetRole,
    ) -> StorageResult<Option<EvaluationTemplate>> {
        let templates = self.templates.lock().unwrap();
        Ok(templates
            .values()
            .filter(|t| t.is_active && t.milestone == milestone && t.target_role == role)
            .max_by_key(|t| t.version)
            .cloned())
    }

    async fn find_by_id(&self, id: TemplateId) -> StorageResult<Option<EvaluationTemplate>> {
        let templates = self.templates.lock().unwrap();
        Ok(templates.get(&id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryAssignmentStore
// ---------------------------------------------------------------------------

/// In-memory assignment store. Keeps insertion order so listings come back
/// in creation order.
#[derive(Debug, Default)]
pub struct MemoryAssignmentStore {
    assignments: Mutex<Vec<EvaluationAssignment>>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored assignments.
    pub fn len(&self) -> usize {
        self.assignments.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn save(&self, assignment: &EvaluationAssignment) -> StorageResult<()> {
        let mut assignments = self.assignments.lock().unwrap();
        let duplicate = assignments.iter().any(|a| {
            a.id != assignment.id
                && a.collaborator_id == assignment.collaborator_id
                && a.template_id == assignment.template_id
        });
        if duplicate {
            return Err(StorageError::conflict(
                "assignment",
                format!(
                    "collaborator {} already has an assignment for template {}",
                    assignment.collaborator_id, assignment.template_id
                ),
            ));
        }
        match assignments.iter_mut().find(|a| a.id == assignment.id) {
            Some(existing) => *existing = assignment.clone(),
            None => assignments.push(assignment.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: AssignmentId) -> StorageResult<Option<EvaluationAssignment>> {
        let assignments = self.assignments.lock().unwrap();
        Ok(assignments.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_collaborator_id(
        &self,
        collaborator: InternalId,
    ) -> StorageResult<Vec<EvaluationAssignment>> {
        let assignments = self.assignments.lock().unwrap();
        Ok(assignments
            .iter()
            .filter(|a| a.collaborator_id == collaborator)
            .cloned()
            .collect())
    }

    async fn find_by_collaborator_and_milestone(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
    ) -> StorageResult<Vec<EvaluationAssignment>> {
        let assignments = self.assignments.lock().unwrap();
        Ok(assignments
            .iter()
            .filter(|a| a.collaborator_id == collaborator && a.milestone == milestone)
            .cloned()
            .collect())
    }

    async fn find_all_pending(&self) -> StorageResult<Vec<EvaluationAssignment>> {
        let assignments = self.assignments.lock().unwrap();
        Ok(assignments
            .iter()
            .filter(|a| a.status.is_open())
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryMilestoneResultStore
// ---------------------------------------------------------------------------

/// In-memory milestone result store keyed by (collaborator, milestone).
#[derive(Debug, Default)]
pub struct MemoryMilestoneResultStore {
    results: Mutex<HashMap<(InternalId, Milestone), MilestoneResult>>,
}

impl MemoryMilestoneResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MilestoneResultStore for MemoryMilestoneResultStore {
    async fn save(&self, result: &MilestoneResult) -> StorageResult<()> {
        let mut results = self.results.lock().unwrap();
        let key = (result.collaborator_id, result.milestone);
        if results.contains_key(&key) {
            return Err(StorageError::conflict(
                "milestone_result",
                format!(
                    "result for collaborator {} at {} already exists",
                    result.collaborator_id, result.milestone
                ),
            ));
        }
        results.insert(key, result.clone());
        Ok(())
    }

    async fn find_by_collaborator_and_milestone(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
    ) -> StorageResult<Option<MilestoneResult>> {
        let results = self.results.lock().unwrap();
        Ok(results.get(&(collaborator, milestone)).cloned())
    }

    async fn find_by_collaborator(
        &self,
        collaborator: InternalId,
    ) -> StorageResult<Vec<MilestoneResult>> {
        let results = self.results.lock().unwrap();
        let mut found: Vec<MilestoneResult> = results
            .values()
            .filter(|r| r.collaborator_id == collaborator)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.milestone);
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// MemoryActionPlanService
// ---------------------------------------------------------------------------

/// In-memory action plan service enforcing one `Active` plan per collaborator.
#[derive(Debug, Default)]
pub struct MemoryActionPlanService {
    plans: Mutex<Vec<ActionPlan>>,
}

impl MemoryActionPlanService {
    pub fn new() -> Self {
        Self::default()
    }

    /// All plans ever created for a collaborator, oldest first.
    pub fn plans_for(&self, collaborator: CollaboratorId) -> Vec<ActionPlan> {
        let plans = self.plans.lock().unwrap();
        plans
            .iter()
            .filter(|p| p.collaborator_id == collaborator)
            .cloned()
            .collect()
    }

    /// Close the active plan of a collaborator, if any.
    pub fn complete_active(&self, collaborator: CollaboratorId) {
        let mut plans = self.plans.lock().unwrap();
        for plan in plans.iter_mut() {
            if plan.collaborator_id == collaborator && plan.status == ActionPlanStatus::Active {
                plan.status = ActionPlanStatus::Completed;
            }
        }
    }
}

#[async_trait]
impl ActionPlanService for MemoryActionPlanService {
    async fn assign(&self, request: NewActionPlan) -> StorageResult<ActionPlan> {
        let mut plans = self.plans.lock().unwrap();
        let has_active = plans.iter().any(|p| {
            p.collaborator_id == request.collaborator_id && p.status == ActionPlanStatus::Active
        });
        if has_active {
            return Err(StorageError::conflict(
                "action_plan",
                format!(
                    "collaborator {} already has an active action plan",
                    request.collaborator_id
                ),
            ));
        }

        let plan = ActionPlan {
            id: ActionPlanId::new(),
            collaborator_id: request.collaborator_id,
            plan_type: request.plan_type,
            status: ActionPlanStatus::Active,
            description: request.description,
            goals: request.goals,
            due_date: request.due_date,
            created_at: Utc::now(),
        };
        plans.push(plan.clone());
        Ok(plan)
    }

    async fn find_active(&self, collaborator: CollaboratorId) -> StorageResult<Option<ActionPlan>> {
        let plans = self.plans.lock().unwrap();
        Ok(plans
            .iter()
            .find(|p| p.collaborator_id == collaborator && p.status == ActionPlanStatus::Active)
            .cloned())
    }
}
