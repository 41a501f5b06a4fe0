//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use onboarding_core::{EngineConfig, EnginePorts, OnboardingEngine};
use onboarding_state::fakes::{
    MemoryActionPlanService, MemoryAssignmentStore, MemoryCollaboratorDirectory,
    MemoryMilestoneResultStore, MemoryTemplateCatalog,
};
use onboarding_state::{
    Answer, AssignmentStore, Collaborator, CollaboratorDirectory, EvaluationAssignment,
    EvaluationTemplate, Milestone, MilestoneResultStore, Question, QuestionType, SurrealConfig,
    SurrealAssignmentStore, SurrealMilestoneResultStore, TargetRole,
};

/// Admission date used by every scenario.
pub fn admission() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

/// `hours` after admission.
pub fn at(hours: i64) -> DateTime<Utc> {
    admission() + Duration::hours(hours)
}

fn questionnaire(milestone: Milestone, role: TargetRole) -> EvaluationTemplate {
    EvaluationTemplate::new(
        milestone,
        role,
        format!("{milestone} {} check-in", role.label()),
        vec![
            Question::scale(1, "Feels welcome in the team"),
            Question::scale(2, "Has the tools and access needed"),
            Question::scale(3, "Understands current responsibilities"),
            Question::scale(4, "Knows who to ask for help"),
            Question::open_text(5, "Anything else to share?"),
        ],
    )
}

/// Scale answers in question order, plus a comment for the open question.
pub fn answers(template: &EvaluationTemplate, scores: &[f64]) -> Vec<Answer> {
    let scale = template
        .questions
        .iter()
        .filter(|q| q.question_type == QuestionType::Scale1To4);
    let mut answers: Vec<Answer> = scores
        .iter()
        .zip(scale)
        .map(|(score, q)| Answer::new(q.id, *score))
        .collect();
    if let Some(open) = template
        .questions
        .iter()
        .find(|q| q.question_type == QuestionType::OpenText)
    {
        answers.push(Answer::new(open.id, "no further comments"));
    }
    answers
}

fn plain_directory(directory: Arc<MemoryCollaboratorDirectory>) -> Arc<dyn CollaboratorDirectory> {
    directory
}

pub struct Harness {
    pub engine: OnboardingEngine,
    pub directory: Arc<MemoryCollaboratorDirectory>,
    pub catalog: Arc<MemoryTemplateCatalog>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub results: Arc<dyn MilestoneResultStore>,
    pub plans: Arc<MemoryActionPlanService>,
    pub collaborator: Collaborator,
    templates: HashMap<(Milestone, TargetRole), EvaluationTemplate>,
}

impl Harness {
    /// In-memory fakes for every port.
    pub fn new(config: EngineConfig) -> Self {
        Self::build(
            config,
            plain_directory,
            Arc::new(MemoryAssignmentStore::new()),
            Arc::new(MemoryMilestoneResultStore::new()),
        )
    }

    /// In-memory fakes, with the collaborator directory wrapped by `wrap`.
    pub fn with_directory(
        config: EngineConfig,
        wrap: impl FnOnce(Arc<MemoryCollaboratorDirectory>) -> Arc<dyn CollaboratorDirectory>,
    ) -> Self {
        Self::build(
            config,
            wrap,
            Arc::new(MemoryAssignmentStore::new()),
            Arc::new(MemoryMilestoneResultStore::new()),
        )
    }

    /// SurrealDB `mem://` stores for assignments and results.
    pub async fn surreal(config: EngineConfig) -> Self {
        let db = onboarding_state::connect(&SurrealConfig::in_memory())
            .await
            .expect("connect mem://");
        Self::build(
            config,
            plain_directory,
            Arc::new(SurrealAssignmentStore::new(db.clone())),
            Arc::new(SurrealMilestoneResultStore::new(db)),
        )
    }

    pub fn with_results(
        config: EngineConfig,
        results: Arc<dyn MilestoneResultStore>,
    ) -> Self {
        Self::build(
            config,
            plain_directory,
            Arc::new(MemoryAssignmentStore::new()),
            results,
        )
    }

    fn build(
        config: EngineConfig,
        wrap: impl FnOnce(Arc<MemoryCollaboratorDirectory>) -> Arc<dyn CollaboratorDirectory>,
        assignments: Arc<dyn AssignmentStore>,
        results: Arc<dyn MilestoneResultStore>,
    ) -> Self {
        let directory = Arc::new(MemoryCollaboratorDirectory::new());
        let collaborator = Collaborator::new(101, "Morgan Diaz", admission());
        directory.insert(collaborator.clone());

        let catalog = Arc::new(MemoryTemplateCatalog::new());
        let mut templates = HashMap::new();
        for (milestone, role) in [
            (Milestone::Day1, TargetRole::Collaborator),
            (Milestone::Week1, TargetRole::Collaborator),
            (Milestone::Week1, TargetRole::TeamLeader),
            (Milestone::Month1, TargetRole::Collaborator),
            (Milestone::Month1, TargetRole::TeamLeader),
        ] {
            let template = questionnaire(milestone, role);
            catalog.insert(template.clone());
            templates.insert((milestone, role), template);
        }

        let plans = Arc::new(MemoryActionPlanService::new());
        let ports = EnginePorts {
            collaborators: wrap(directory.clone()),
            templates: catalog.clone(),
            assignments: assignments.clone(),
            results: results.clone(),
            action_plans: plans.clone(),
        };

        Self {
            engine: OnboardingEngine::new(ports, config),
            directory,
            catalog,
            assignments,
            results,
            plans,
            collaborator,
            templates,
        }
    }

    pub fn template(&self, milestone: Milestone, role: TargetRole) -> &EvaluationTemplate {
        &self.templates[&(milestone, role)]
    }

    /// Swap in a new active version of a template.
    pub fn publish_new_version(&mut self, milestone: Milestone, role: TargetRole) -> EvaluationTemplate {
        let mut next = questionnaire(milestone, role);
        next.version = self.templates[&(milestone, role)].version + 1;
        self.catalog.deactivate(self.templates[&(milestone, role)].id);
        self.catalog.insert(next.clone());
        self.templates.insert((milestone, role), next.clone());
        next
    }

    pub async fn milestone_assignments(&self, milestone: Milestone) -> Vec<EvaluationAssignment> {
        self.assignments
            .find_by_collaborator_and_milestone(self.collaborator.internal_id, milestone)
            .await
            .unwrap()
    }

    /// The assignment answering the current template of (milestone, role).
    pub async fn assignment(&self, milestone: Milestone, role: TargetRole) -> EvaluationAssignment {
        let template_id = self.template(milestone, role).id;
        self.milestone_assignments(milestone)
            .await
            .into_iter()
            .find(|a| a.template_id == template_id)
            .unwrap_or_else(|| panic!("no {milestone} {role} assignment"))
    }

    pub async fn current_collaborator(&self) -> Collaborator {
        self.directory
            .find_by_id(self.collaborator.id)
            .await
            .unwrap()
            .unwrap()
    }

    /// Submit `scores` for (milestone, role) at `now`.
    pub async fn submit(
        &self,
        milestone: Milestone,
        role: TargetRole,
        scores: &[f64],
        now: DateTime<Utc>,
    ) -> onboarding_core::SubmissionOutcome {
        let assignment = self.assignment(milestone, role).await;
        let answers = answers(self.template(milestone, role), scores);
        self.engine
            .submit_at(assignment.id, answers, None, now)
            .await
            .unwrap()
    }
}
