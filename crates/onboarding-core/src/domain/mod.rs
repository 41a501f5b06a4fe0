//! Domain definitions for the onboarding engine.
//!
//! - `milestones`: static milestone policy (required roles, due offsets, successors)
//! - `error`: the engine error taxonomy

pub mod error;
pub mod milestones;

pub use error::{OnboardingError, Result, ValidationIssue};
pub use milestones::{due_date, policy, required_roles, successor, DueOffset, MilestonePolicy};
