use onboarding_state::{Milestone, TargetRole};

use super::{round_one_decimal, scored_for, Calculation, RoledAssignment, ScoreStrategy};

pub const COLLABORATOR_WEIGHT: f64 = 0.4;
pub const TEAM_LEADER_WEIGHT: f64 = 0.6;

/// `round(col × 0.4 + tl × 0.6, 1)`.
pub fn weighted_score(collaborator: f64, team_leader: f64) -> f64 {
    round_one_decimal(collaborator * COLLABORATOR_WEIGHT + team_leader * TEAM_LEADER_WEIGHT)
}

/// DAY_1: the collaborator's own score.
#[derive(Debug, Clone, Copy, Default)]
pub struct Day1Strategy;

impl ScoreStrategy for Day1Strategy {
    fn milestone(&self) -> Milestone {
        Milestone::Day1
    }

    fn can_calculate(&self, assignments: &[RoledAssignment]) -> bool {
        scored_for(assignments, TargetRole::Collaborator).is_some()
    }

    fn calculate(&self, assignments: &[RoledAssignment]) -> Option<Calculation> {
        let score = scored_for(assignments, TargetRole::Collaborator)?;
        Some(Calculation {
            final_score: score,
            formula: format!("Average(Collaborator) = {score:.1}"),
        })
    }
}

/// WEEK_1: whichever single score is available.
///
/// Consolidates as soon as one role has answered, so a later answer from the
/// other role never changes the result. When both are scored by the time it
/// runs, the collaborator's score is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct Week1Strategy;

impl Week1Strategy {
    fn pick(assignments: &[RoledAssignment]) -> Option<(TargetRole, f64)> {
        [TargetRole::Collaborator, TargetRole::TeamLeader]
            .into_iter()
            .find_map(|role| scored_for(assignments, role).map(|score| (role, score)))
    }
}

impl ScoreStrategy for Week1Strategy {
    fn milestone(&self) -> Milestone {
        Milestone::Week1
    }

    fn can_calculate(&self, assignments: &[RoledAssignment]) -> bool {
        Self::pick(assignments).is_some()
    }

    fn calculate(&self, assignments: &[RoledAssignment]) -> Option<Calculation> {
        let (role, score) = Self::pick(assignments)?;
        Some(Calculation {
            final_score: score,
            formula: format!("Average({}) = {score:.1}", role.label()),
        })
    }
}

/// MONTH_1: weighted blend, leader-heavy. Needs both roles scored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Month1Strategy;

impl ScoreStrategy for Month1Strategy {
    fn milestone(&self) -> Milestone {
        Milestone::Month1
    }

    fn can_calculate(&self, assignments: &[RoledAssignment]) -> bool {
        scored_for(assignments, TargetRole::Collaborator).is_some()
            && scored_for(assignments, TargetRole::TeamLeader).is_some()
    }

    fn calculate(&self, assignments: &[RoledAssignment]) -> Option<Calculation> {
        let collaborator = scored_for(assignments, TargetRole::Collaborator)?;
        let team_leader = scored_for(assignments, TargetRole::TeamLeader)?;
        let final_score = weighted_score(collaborator, team_leader);
        Some(Calculation {
            final_score,
            formula: format!(
                "({collaborator:.1} × {COLLABORATOR_WEIGHT}) + ({team_leader:.1} × {TEAM_LEADER_WEIGHT}) = {final_score:.1}"
            ),
        })
    }
}
