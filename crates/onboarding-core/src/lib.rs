//! Onboarding Core
//!
//! Evaluation lifecycle and risk scoring for new-hire onboarding: assigns
//! milestone evaluations, scores submissions, classifies risk, and runs the
//! best-effort cascade (risk update, result aggregation, action plan,
//! advancement) after every completed assignment.
//!
//! Storage and sibling aggregates are reached through the port traits of
//! `onboarding_state`; [`OnboardingEngine`] wires them together.

pub mod action_plans;
pub mod advancement;
pub mod aggregation;
pub mod assignment;
pub mod cascade;
pub mod config;
pub mod domain;
pub mod engine;
pub mod metrics;
pub mod obs;
pub mod risk;
pub mod scoring;
pub mod submission;
pub mod telemetry;

pub use action_plans::{ActionPlanAutoAssigner, ActionPlanOutcome};
pub use advancement::{AdvancementOutcome, NextMilestoneAdvancer};
pub use aggregation::{AggregationOutcome, MilestoneResultAggregator};
pub use assignment::{AssignmentOrchestrator, MilestoneAssignments, SkipReason, SkippedRole};
pub use cascade::{CascadeCoordinator, CascadeReport, CascadeStep, StepOutcome, StepReport};
pub use config::{DedupPolicy, EngineConfig, RiskPolicy};
pub use domain::{OnboardingError, Result, ValidationIssue};
pub use engine::{EnginePorts, OnboardingEngine, PendingFilter, ReplayStep, SubmissionOutcome};
pub use risk::classify;
pub use scoring::{individual_score, Calculation, ScoreCalculatorFactory, ScoreStrategy};
pub use submission::{validate_answers, SubmissionProcessor};
