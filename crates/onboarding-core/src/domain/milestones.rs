//! Static milestone policy: which roles answer, when it is due, what comes next.

use chrono::{DateTime, Duration, Months, Utc};
use onboarding_state::{Milestone, TargetRole};

/// Offset from the admission date to an assignment's due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueOffset {
    Days(i64),
    /// Calendar months (end-of-month clamped by chrono).
    Months(u32),
}

impl DueOffset {
    /// `None` only when the result would overflow the calendar.
    pub fn apply(self, admission: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DueOffset::Days(days) => admission.checked_add_signed(Duration::days(days)),
            DueOffset::Months(months) => admission.checked_add_months(Months::new(months)),
        }
    }
}

/// Policy row for one milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestonePolicy {
    pub milestone: Milestone,
    pub required_roles: &'static [TargetRole],
    pub due_offset: DueOffset,
    pub successor: Option<Milestone>,
}

pub static MILESTONE_POLICIES: [MilestonePolicy; 3] = [
    MilestonePolicy {
        milestone: Milestone::Day1,
        required_roles: &[TargetRole::Collaborator],
        due_offset: DueOffset::Days(1),
        successor: Some(Milestone::Week1),
    },
    MilestonePolicy {
        milestone: Milestone::Week1,
        required_roles: &[TargetRole::Collaborator, TargetRole::TeamLeader],
        due_offset: DueOffset::Days(7),
        successor: Some(Milestone::Month1),
    },
    MilestonePolicy {
        milestone: Milestone::Month1,
        required_roles: &[TargetRole::Collaborator, TargetRole::TeamLeader],
        due_offset: DueOffset::Months(1),
        successor: None,
    },
];

pub fn policy(milestone: Milestone) -> &'static MilestonePolicy {
    match milestone {
        Milestone::Day1 => &MILESTONE_POLICIES[0],
        Milestone::Week1 => &MILESTONE_POLICIES[1],
        Milestone::Month1 => &MILESTONE_POLICIES[2],
    }
}

pub fn required_roles(milestone: Milestone) -> &'static [TargetRole] {
    policy(milestone).required_roles
}

pub fn successor(milestone: Milestone) -> Option<Milestone> {
    policy(milestone).successor
}

pub fn due_date(milestone: Milestone, admission: DateTime<Utc>) -> Option<DateTime<Utc>> {
    policy(milestone).due_offset.apply(admission)
}
