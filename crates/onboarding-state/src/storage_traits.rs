//! Port trait definitions for the onboarding engine
//!
//! The engine talks to every aggregate it does not own through one of these
//! narrow async traits:
//! - `CollaboratorDirectory`: collaborator lookup and risk-level writes
//! - `TemplateCatalog`: active questionnaire resolution
//! - `AssignmentStore`: evaluation assignment persistence
//! - `MilestoneResultStore`: consolidated milestone results
//! - `ActionPlanService`: remediation plan creation
//!
//! All traits are backend-agnostic. In-memory fakes live in the `fakes`
//! module; SurrealDB-backed stores for assignments and results live in
//! `surreal_store`.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::records::{
    ActionPlan, AssignmentId, Collaborator, CollaboratorId, EvaluationAssignment,
    EvaluationTemplate, InternalId, Milestone, MilestoneResult, NewActionPlan, TargetRole,
    TemplateId,
};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// CollaboratorDirectory
// ---------------------------------------------------------------------------

/// Read/write access to collaborators.
#[async_trait]
pub trait CollaboratorDirectory: Send + Sync {
    /// Look up by public id. `Ok(None)` when absent.
    async fn find_by_id(&self, id: CollaboratorId) -> StorageResult<Option<Collaborator>>;

    /// Look up by internal numeric reference. `Ok(None)` when absent.
    async fn find_by_internal_id(&self, id: InternalId) -> StorageResult<Option<Collaborator>>;

    /// Persist the collaborator (insert or replace).
    async fn save(&self, collaborator: &Collaborator) -> StorageResult<()>;
}

// ---------------------------------------------------------------------------
// TemplateCatalog
// ---------------------------------------------------------------------------

/// Read-only access to questionnaire templates.
///
/// At most one template is active per (milestone, role); the catalog returns
/// the highest-version active one if administration left more than one.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    async fn find_active_by_milestone_and_role(
        &self,
        milestone: Milestone,
        role: TargetRole,
    ) -> StorageResult<Option<EvaluationTemplate>>;

    async fn find_by_id(&self, id: TemplateId) -> StorageResult<Option<EvaluationTemplate>>;
}

// ---------------------------------------------------------------------------
// AssignmentStore
// ---------------------------------------------------------------------------

/// Evaluation assignment persistence.
///
/// Guarantees:
/// - `save` inserts or replaces by `id`.
/// - A second assignment for the same (collaborator, template) is rejected
///   with `StorageError::Conflict`.
/// - Listing methods return assignments in creation order.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn save(&self, assignment: &EvaluationAssignment) -> StorageResult<()>;

    async fn find_by_id(&self, id: AssignmentId) -> StorageResult<Option<EvaluationAssignment>>;

    async fn find_by_collaborator_id(
        &self,
        collaborator: InternalId,
    ) -> StorageResult<Vec<EvaluationAssignment>>;

    async fn find_by_collaborator_and_milestone(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
    ) -> StorageResult<Vec<EvaluationAssignment>>;

    /// Every assignment still `Pending` or `InProgress`.
    async fn find_all_pending(&self) -> StorageResult<Vec<EvaluationAssignment>>;
}

// ---------------------------------------------------------------------------
// MilestoneResultStore
// ---------------------------------------------------------------------------

/// Consolidated milestone results.
///
/// Guarantees:
/// - At most one result per (collaborator, milestone); a second `save` is
///   rejected with `StorageError::Conflict`.
/// - Results are immutable once saved.
#[async_trait]
pub trait MilestoneResultStore: Send + Sync {
    async fn save(&self, result: &MilestoneResult) -> StorageResult<()>;

    async fn find_by_collaborator_and_milestone(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
    ) -> StorageResult<Option<MilestoneResult>>;

    /// All results for a collaborator, in milestone order.
    async fn find_by_collaborator(
        &self,
        collaborator: InternalId,
    ) -> StorageResult<Vec<MilestoneResult>>;
}

// ---------------------------------------------------------------------------
// ActionPlanService
// ---------------------------------------------------------------------------

/// Remediation plan creation.
///
/// Invariant: at most one `Active` plan per collaborator. `assign` fails with
/// `StorageError::Conflict` when one already exists.
#[async_trait]
pub trait ActionPlanService: Send + Sync {
    async fn assign(&self, request: NewActionPlan) -> StorageResult<ActionPlan>;

    async fn find_active(&self, collaborator: CollaboratorId) -> StorageResult<Option<ActionPlan>>;
}
