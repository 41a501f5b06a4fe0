//! Engine configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which score sets the collaborator's risk level after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskPolicy {
    /// The submitted assignment's own score.
    #[default]
    LatestEvaluation,
    /// `col × 0.4 + tl × 0.6` over the milestone once both roles are scored.
    WeightedMilestone,
}

impl FromStr for RiskPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" | "latest_evaluation" => Ok(RiskPolicy::LatestEvaluation),
            "weighted" | "weighted_milestone" => Ok(RiskPolicy::WeightedMilestone),
            other => Err(format!(
                "unknown risk policy '{other}' (expected 'latest' or 'weighted')"
            )),
        }
    }
}

/// How the orchestrator decides a role is already assigned for a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// An existing assignment on the same template id. A new template
    /// version yields a second assignment for the role.
    #[default]
    ByTemplate,
    /// Any existing assignment whose template targets the same role.
    ByRole,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "template" | "by_template" => Ok(DedupPolicy::ByTemplate),
            "role" | "by_role" => Ok(DedupPolicy::ByRole),
            other => Err(format!(
                "unknown dedup policy '{other}' (expected 'template' or 'role')"
            )),
        }
    }
}

pub const DEFAULT_ACTION_PLAN_HORIZON_DAYS: i64 = 30;

/// Longest horizon accepted from the environment (ten years).
pub const MAX_ACTION_PLAN_HORIZON_DAYS: i64 = 3650;

/// Tunables of the evaluation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub risk_policy: RiskPolicy,
    pub dedup_policy: DedupPolicy,
    /// Days from plan creation to an auto-created plan's due date.
    pub action_plan_horizon_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_policy: RiskPolicy::default(),
            dedup_policy: DedupPolicy::default(),
            action_plan_horizon_days: DEFAULT_ACTION_PLAN_HORIZON_DAYS,
        }
    }
}

impl EngineConfig {
    pub fn with_risk_policy(mut self, policy: RiskPolicy) -> Self {
        self.risk_policy = policy;
        self
    }

    pub fn with_dedup_policy(mut self, policy: DedupPolicy) -> Self {
        self.dedup_policy = policy;
        self
    }

    pub fn with_action_plan_horizon_days(mut self, days: i64) -> Self {
        self.action_plan_horizon_days = days;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - ONBOARDING_RISK_POLICY (optional, `latest` | `weighted`, default: `latest`)
    /// - ONBOARDING_DEDUP_POLICY (optional, `template` | `role`, default: `template`)
    /// - ONBOARDING_ACTION_PLAN_DAYS (optional, 1..=3650, default: 30)
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, String> {
        let mut config = Self::default();

        if let Some(value) = lookup("ONBOARDING_RISK_POLICY") {
            config.risk_policy = value.parse()?;
        }
        if let Some(value) = lookup("ONBOARDING_DEDUP_POLICY") {
            config.dedup_policy = value.parse()?;
        }
        if let Some(value) = lookup("ONBOARDING_ACTION_PLAN_DAYS") {
            let days: i64 = value
                .parse()
                .map_err(|_| format!("ONBOARDING_ACTION_PLAN_DAYS is not an integer: {value}"))?;
            if !(1..=MAX_ACTION_PLAN_HORIZON_DAYS).contains(&days) {
                return Err(format!(
                    "ONBOARDING_ACTION_PLAN_DAYS must be between 1 and {MAX_ACTION_PLAN_HORIZON_DAYS}, got {days}"
                ));
            }
            config.action_plan_horizon_days = days;
        }

        Ok(config)
    }
}
