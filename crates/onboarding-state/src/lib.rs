//! Onboarding-State: records, ports and persistence for the onboarding engine
//!
//! This crate owns the data records the evaluation engine reads and writes,
//! the async port traits through which it reaches every aggregate, in-memory
//! fakes of those ports, and SurrealDB-backed stores for the two aggregates
//! the engine owns (assignments and milestone results).
//!
//! ## Key Components
//!
//! - `records`: `EvaluationAssignment`, `EvaluationTemplate`, `MilestoneResult`, ...
//! - `storage_traits`: `CollaboratorDirectory`, `TemplateCatalog`, `AssignmentStore`,
//!   `MilestoneResultStore`, `ActionPlanService`
//! - `fakes`: `Memory*` implementations of every port
//! - `surreal_store`: `SurrealAssignmentStore`, `SurrealMilestoneResultStore`

mod error;
pub mod fakes;
mod handle;
pub mod migrations;
pub mod records;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use handle::{connect, SurrealConfig};
pub use records::{
    ActionPlan, ActionPlanId, ActionPlanStatus, ActionPlanType, Answer, AnswerValue,
    AssignmentId, AssignmentStatus, Collaborator, CollaboratorId, DimensionId,
    EvaluationAssignment, EvaluationTemplate, InternalId, Milestone, MilestoneResult,
    NewActionPlan, Question, QuestionId, QuestionType, ResultId, RiskLevel, TargetRole,
    TemplateId, UserId,
};
pub use schema::{AssignmentRow, MilestoneResultRow};
pub use storage_traits::{
    ActionPlanService, AssignmentStore, CollaboratorDirectory, MilestoneResultStore,
    StorageResult, TemplateCatalog,
};
pub use surreal_store::{SurrealAssignmentStore, SurrealMilestoneResultStore};

/// Result type for onboarding-state setup operations
pub type Result<T> = std::result::Result<T, StateError>;
