//! Record types shared by the storage ports and the evaluation engine.
//!
//! These are plain data records. Lifecycle rules (which transitions are
//! legal, when a score may be set) are enforced by the engine before a record
//! is handed back to a store; the helpers here only perform the mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map($name)
            }
        }
    };
}

uuid_id!(
    /// Public identifier of a collaborator (the new hire).
    CollaboratorId
);
uuid_id!(
    /// Identifier of an evaluation assignment.
    AssignmentId
);
uuid_id!(
    /// Identifier of a questionnaire template.
    TemplateId
);
uuid_id!(
    /// Identifier of a question inside a template.
    QuestionId
);
uuid_id!(
    /// Identifier of the evaluation dimension a question measures.
    DimensionId
);
uuid_id!(
    /// Identifier of a platform user (evaluator).
    UserId
);
uuid_id!(
    /// Identifier of a consolidated milestone result.
    ResultId
);
uuid_id!(
    /// Identifier of a remediation action plan.
    ActionPlanId
);

/// Internal numeric reference to a collaborator.
///
/// Assignments and milestone results are keyed by this reference rather than
/// by the public [`CollaboratorId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalId(pub i64);

impl std::fmt::Display for InternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Fixed onboarding checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Milestone {
    #[serde(rename = "DAY_1")]
    Day1,
    #[serde(rename = "WEEK_1")]
    Week1,
    #[serde(rename = "MONTH_1")]
    Month1,
}

impl Milestone {
    /// All milestones in onboarding order.
    pub const ALL: [Milestone; 3] = [Milestone::Day1, Milestone::Week1, Milestone::Month1];

    pub fn as_str(self) -> &'static str {
        match self {
            Milestone::Day1 => "DAY_1",
            Milestone::Week1 => "WEEK_1",
            Milestone::Month1 => "MONTH_1",
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Milestone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAY_1" => Ok(Milestone::Day1),
            "WEEK_1" => Ok(Milestone::Week1),
            "MONTH_1" => Ok(Milestone::Month1),
            other => Err(format!("unknown milestone: {other}")),
        }
    }
}

/// Who must answer a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetRole {
    Collaborator,
    TeamLeader,
}

impl TargetRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetRole::Collaborator => "COLLABORATOR",
            TargetRole::TeamLeader => "TEAM_LEADER",
        }
    }

    /// Human-readable label used in calculation formulas.
    pub fn label(self) -> &'static str {
        match self {
            TargetRole::Collaborator => "Collaborator",
            TargetRole::TeamLeader => "TeamLeader",
        }
    }
}

impl std::fmt::Display for TargetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COLLABORATOR" => Ok(TargetRole::Collaborator),
            "TEAM_LEADER" => Ok(TargetRole::TeamLeader),
            other => Err(format!("unknown target role: {other}")),
        }
    }
}

/// Assignment lifecycle state.
///
/// Legal transitions: `Pending → InProgress → Completed` and
/// `Pending → Completed`. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "PENDING",
            AssignmentStatus::InProgress => "IN_PROGRESS",
            AssignmentStatus::Completed => "COMPLETED",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: AssignmentStatus) -> bool {
        matches!(
            (self, next),
            (AssignmentStatus::Pending, AssignmentStatus::InProgress)
                | (AssignmentStatus::Pending, AssignmentStatus::Completed)
                | (AssignmentStatus::InProgress, AssignmentStatus::Completed)
        )
    }

    /// Still waiting on an answer (`Pending` or `InProgress`).
    pub fn is_open(self) -> bool {
        !matches!(self, AssignmentStatus::Completed)
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AssignmentStatus::Pending),
            "IN_PROGRESS" => Ok(AssignmentStatus::InProgress),
            "COMPLETED" => Ok(AssignmentStatus::Completed),
            other => Err(format!("unknown assignment status: {other}")),
        }
    }
}

/// Answer format of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "SCALE_1_4")]
    Scale1To4,
    #[serde(rename = "OPEN_TEXT")]
    OpenText,
}

/// Onboarding risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    None,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
            RiskLevel::None => "NONE",
        }
    }

    /// HIGH and MEDIUM trigger a remediation plan.
    pub fn is_at_risk(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Medium)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(RiskLevel::High),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "LOW" => Ok(RiskLevel::Low),
            "NONE" => Ok(RiskLevel::None),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Remediation program kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionPlanType {
    /// 30-day development plan for high-risk collaborators.
    #[serde(rename = "PD_30")]
    Pd30,
    /// 30-day follow-up plan for medium-risk collaborators.
    #[serde(rename = "PDF_30")]
    Pdf30,
    /// 60-day follow-up plan, assigned manually.
    #[serde(rename = "SE_60")]
    Se60,
}

impl ActionPlanType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionPlanType::Pd30 => "PD_30",
            ActionPlanType::Pdf30 => "PDF_30",
            ActionPlanType::Se60 => "SE_60",
        }
    }
}

impl std::fmt::Display for ActionPlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPlanStatus {
    Active,
    Completed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Templates and answers
// ---------------------------------------------------------------------------

/// A single question of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub dimension_id: DimensionId,
    pub prompt: String,
    pub question_type: QuestionType,
    pub order: u32,
    pub required: bool,
}

impl Question {
    /// Required 1–4 scale question.
    pub fn scale(order: u32, prompt: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(),
            dimension_id: DimensionId::new(),
            prompt: prompt.into(),
            question_type: QuestionType::Scale1To4,
            order,
            required: true,
        }
    }

    /// Optional free-text question.
    pub fn open_text(order: u32, prompt: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(),
            dimension_id: DimensionId::new(),
            prompt: prompt.into(),
            question_type: QuestionType::OpenText,
            order,
            required: false,
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Versioned questionnaire answered by one target role at one milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTemplate {
    pub id: TemplateId,
    pub milestone: Milestone,
    pub target_role: TargetRole,
    pub title: String,
    pub description: Option<String>,
    /// Ordered by `Question::order`.
    pub questions: Vec<Question>,
    pub is_active: bool,
    pub version: u32,
}

impl EvaluationTemplate {
    /// Create an active version-1 template; questions are sorted by order.
    pub fn new(
        milestone: Milestone,
        target_role: TargetRole,
        title: impl Into<String>,
        mut questions: Vec<Question>,
    ) -> Self {
        questions.sort_by_key(|q| q.order);
        Self {
            id: TemplateId::new(),
            milestone,
            target_role,
            title: title.into(),
            description: None,
            questions,
            is_active: true,
            version: 1,
        }
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// Raw answer value: a number for scale questions, text for open questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
}

impl AnswerValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            AnswerValue::Text(_) => None,
        }
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

impl Answer {
    pub fn new(question_id: QuestionId, value: impl Into<AnswerValue>) -> Self {
        Self {
            question_id,
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Assignments and results
// ---------------------------------------------------------------------------

/// One person's obligation to answer one template.
///
/// `score` is `Some` exactly when `status == Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationAssignment {
    pub id: AssignmentId,
    pub collaborator_id: InternalId,
    pub evaluator_user_id: Option<UserId>,
    pub template_id: TemplateId,
    pub milestone: Milestone,
    pub status: AssignmentStatus,
    pub due_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub answers: Vec<Answer>,
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvaluationAssignment {
    /// New `Pending` assignment with no evaluator bound.
    pub fn pending(
        collaborator_id: InternalId,
        template_id: TemplateId,
        milestone: Milestone,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            collaborator_id,
            evaluator_user_id: None,
            template_id,
            milestone,
            status: AssignmentStatus::Pending,
            due_date,
            completed_at: None,
            answers: Vec::new(),
            score: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `InProgress`. Callers check the transition first.
    pub fn start(mut self, now: DateTime<Utc>) -> Self {
        self.status = AssignmentStatus::InProgress;
        self.updated_at = now;
        self
    }

    /// Move to `Completed`, recording answers and score. Callers check the
    /// transition first.
    pub fn complete(
        mut self,
        answers: Vec<Answer>,
        score: f64,
        evaluator: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        self.status = AssignmentStatus::Completed;
        self.answers = answers;
        self.score = Some(score);
        if evaluator.is_some() {
            self.evaluator_user_id = evaluator;
        }
        self.completed_at = Some(now);
        self.updated_at = now;
        self
    }

    /// Completed and carrying a score.
    pub fn is_scored(&self) -> bool {
        self.status == AssignmentStatus::Completed && self.score.is_some()
    }
}

/// Consolidated outcome of one milestone for one collaborator. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneResult {
    pub id: ResultId,
    pub collaborator_id: InternalId,
    pub milestone: Milestone,
    pub collaborator_assignment_id: Option<AssignmentId>,
    pub team_leader_assignment_id: Option<AssignmentId>,
    pub final_score: f64,
    pub risk_level: RiskLevel,
    pub calculation_formula: String,
    pub calculated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// External aggregates
// ---------------------------------------------------------------------------

/// New hire being onboarded. Owned by the collaborator directory; the engine
/// only overwrites `risk_level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: CollaboratorId,
    pub internal_id: InternalId,
    pub name: String,
    pub admission_date: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub updated_at: DateTime<Utc>,
}

impl Collaborator {
    pub fn new(internal_id: i64, name: impl Into<String>, admission_date: DateTime<Utc>) -> Self {
        Self {
            id: CollaboratorId::new(),
            internal_id: InternalId(internal_id),
            name: name.into(),
            admission_date,
            risk_level: RiskLevel::None,
            updated_at: admission_date,
        }
    }

    pub fn update_risk_level(&mut self, risk_level: RiskLevel, now: DateTime<Utc>) {
        self.risk_level = risk_level;
        self.updated_at = now;
    }
}

/// Request to open a remediation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActionPlan {
    pub collaborator_id: CollaboratorId,
    pub plan_type: ActionPlanType,
    pub description: String,
    pub goals: Vec<String>,
    pub due_date: DateTime<Utc>,
}

/// Remediation program. Owned by the action-plan subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: ActionPlanId,
    pub collaborator_id: CollaboratorId,
    pub plan_type: ActionPlanType,
    pub status: ActionPlanStatus,
    pub description: String,
    pub goals: Vec<String>,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
