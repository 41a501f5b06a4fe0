//! Automatic remediation plans for at-risk collaborators.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use onboarding_state::{
    ActionPlan, ActionPlanService, ActionPlanType, Collaborator, Milestone, NewActionPlan,
    RiskLevel,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::{OnboardingError, Result};
use crate::metrics::METRICS;
use crate::obs;

const HIGH_RISK_GOALS: [&str; 2] = [
    "Hold weekly one-on-one check-ins with the team leader",
    "Agree on a recovery plan for the onboarding blockers raised",
];

const MEDIUM_RISK_GOALS: [&str; 2] = [
    "Schedule a follow-up conversation with the team leader",
    "Revisit the onboarding material for the lowest-scored areas",
];

/// Plan type and goals for a risk level; `None` when no plan is needed.
pub fn plan_for(risk: RiskLevel) -> Option<(ActionPlanType, &'static [&'static str])> {
    match risk {
        RiskLevel::High => Some((ActionPlanType::Pd30, &HIGH_RISK_GOALS)),
        RiskLevel::Medium => Some((ActionPlanType::Pdf30, &MEDIUM_RISK_GOALS)),
        RiskLevel::Low | RiskLevel::None => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "plan", rename_all = "snake_case")]
pub enum ActionPlanOutcome {
    NotAtRisk,
    Created(ActionPlan),
    /// The collaborator already has an active plan.
    AlreadyActive,
}

/// Opens a plan when a submission lands in the HIGH or MEDIUM band.
#[derive(Clone)]
pub struct ActionPlanAutoAssigner {
    plans: Arc<dyn ActionPlanService>,
    horizon_days: i64,
}

impl ActionPlanAutoAssigner {
    pub fn new(plans: Arc<dyn ActionPlanService>, horizon_days: i64) -> Self {
        Self {
            plans,
            horizon_days,
        }
    }

    #[instrument(
        skip(self, collaborator, now),
        fields(collaborator_id = collaborator.internal_id.0, risk_level = %risk, milestone = %milestone)
    )]
    pub async fn assign_if_at_risk(
        &self,
        collaborator: &Collaborator,
        risk: RiskLevel,
        milestone: Milestone,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<ActionPlanOutcome> {
        let Some((plan_type, goals)) = plan_for(risk) else {
            return Ok(ActionPlanOutcome::NotAtRisk);
        };

        let due_date = Duration::try_days(self.horizon_days)
            .and_then(|horizon| now.checked_add_signed(horizon))
            .ok_or_else(|| {
                OnboardingError::Invalid(format!(
                    "action plan horizon of {} days overflows",
                    self.horizon_days
                ))
            })?;

        let request = NewActionPlan {
            collaborator_id: collaborator.id,
            plan_type,
            description: format!(
                "Automatic {plan_type} plan: {milestone} score {score:.1} classified {risk}"
            ),
            goals: goals.iter().map(|g| g.to_string()).collect(),
            due_date,
        };

        match self.plans.assign(request).await {
            Ok(plan) => {
                obs::emit_action_plan_created(&plan, milestone, risk);
                METRICS.inc_action_plans_created();
                Ok(ActionPlanOutcome::Created(plan))
            }
            Err(e) if e.is_conflict() => {
                info!(error = %e, "active action plan already exists");
                Ok(ActionPlanOutcome::AlreadyActive)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboarding_state::fakes::MemoryActionPlanService;
    use onboarding_state::ActionPlanStatus;

    #[test]
    fn plan_types_by_risk() {
        assert_eq!(plan_for(RiskLevel::High).map(|p| p.0), Some(ActionPlanType::Pd30));
        assert_eq!(plan_for(RiskLevel::Medium).map(|p| p.0), Some(ActionPlanType::Pdf30));
        assert!(plan_for(RiskLevel::Low).is_none());
        assert!(plan_for(RiskLevel::None).is_none());
        assert_eq!(plan_for(RiskLevel::High).unwrap().1.len(), 2);
        assert_eq!(plan_for(RiskLevel::Medium).unwrap().1.len(), 2);
    }

    #[tokio::test]
    async fn creates_once_then_reports_already_active() {
        let service = Arc::new(MemoryActionPlanService::new());
        let assigner = ActionPlanAutoAssigner::new(service.clone(), 30);
        let collaborator = Collaborator::new(1, "Sam Rivera", Utc::now());
        let now = Utc::now();

        let outcome = assigner
            .assign_if_at_risk(&collaborator, RiskLevel::High, Milestone::Day1, 1.0, now)
            .await
            .unwrap();
        let ActionPlanOutcome::Created(plan) = outcome else {
            panic!("expected a plan, got {outcome:?}");
        };
        assert_eq!(plan.plan_type, ActionPlanType::Pd30);
        assert_eq!(plan.status, ActionPlanStatus::Active);
        assert_eq!(plan.due_date, now + Duration::days(30));
        assert!(plan.description.contains("DAY_1"));

        let again = assigner
            .assign_if_at_risk(&collaborator, RiskLevel::Medium, Milestone::Week1, 2.0, now)
            .await
            .unwrap();
        assert_eq!(again, ActionPlanOutcome::AlreadyActive);
        assert_eq!(service.plans_for(collaborator.id).len(), 1);
    }

    #[tokio::test]
    async fn oversized_horizon_is_an_error() {
        let service = Arc::new(MemoryActionPlanService::new());
        let assigner = ActionPlanAutoAssigner::new(service.clone(), 200_000_000_000);
        let collaborator = Collaborator::new(3, "Ana Lima", Utc::now());

        let err = assigner
            .assign_if_at_risk(&collaborator, RiskLevel::High, Milestone::Day1, 1.0, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, OnboardingError::Invalid(_)));
        assert!(err.to_string().contains("200000000000 days"));
        assert!(service.plans_for(collaborator.id).is_empty());
    }

    #[tokio::test]
    async fn low_risk_opens_nothing() {
        let service = Arc::new(MemoryActionPlanService::new());
        let assigner = ActionPlanAutoAssigner::new(service.clone(), 30);
        let collaborator = Collaborator::new(2, "Jo Park", Utc::now());

        let outcome = assigner
            .assign_if_at_risk(&collaborator, RiskLevel::Low, Milestone::Day1, 3.5, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, ActionPlanOutcome::NotAtRisk);
        assert!(service.plans_for(collaborator.id).is_empty());
    }
}
