//! Risk classification.
//!
//! Scores are one-decimal values on the 1–4 scale. The bands are inclusive
//! and only cover one-decimal values; anything outside them, including `0.0`
//! from an evaluation with no scale answers, is `NONE`.

use onboarding_state::{RiskLevel, TargetRole};

use crate::config::RiskPolicy;
use crate::scoring::{scored_for, weighted_score, RoledAssignment};

/// Inclusive score bands, checked in order.
pub const RISK_BANDS: [(f64, f64, RiskLevel); 3] = [
    (1.0, 1.9, RiskLevel::High),
    (2.0, 2.9, RiskLevel::Medium),
    (3.0, 4.0, RiskLevel::Low),
];

/// Map a score to its risk band.
pub fn classify(score: f64) -> RiskLevel {
    RISK_BANDS
        .iter()
        .find(|(low, high, _)| (*low..=*high).contains(&score))
        .map(|(_, _, level)| *level)
        .unwrap_or(RiskLevel::None)
}

/// Score that drives the collaborator's risk level after a submission.
///
/// - `LatestEvaluation`: the submitted assignment's own score.
/// - `WeightedMilestone`: the weighted blend of the milestone's scored
///   collaborator and team-leader assignments when both exist, otherwise the
///   submitted score.
pub fn risk_score(policy: RiskPolicy, submitted: f64, milestone: &[RoledAssignment]) -> f64 {
    match policy {
        RiskPolicy::LatestEvaluation => submitted,
        RiskPolicy::WeightedMilestone => match (
            scored_for(milestone, TargetRole::Collaborator),
            scored_for(milestone, TargetRole::TeamLeader),
        ) {
            (Some(collaborator), Some(team_leader)) => weighted_score(collaborator, team_leader),
            _ => submitted,
        },
    }
}
