//! Onboarding - evaluation lifecycle CLI
//!
//! The `onboarding` command drives the evaluation engine from the terminal.
//!
//! ## Commands
//!
//! - `demo`: seed templates and a collaborator, then walk DAY_1 → WEEK_1 →
//!   MONTH_1 with the given scores and print every cascade report
//! - `classify`: print the risk level of a score

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use onboarding_core::metrics::{MetricsSnapshot, METRICS};
use onboarding_core::{
    classify, DedupPolicy, EngineConfig, EnginePorts, OnboardingEngine, PendingFilter,
    RiskPolicy, SubmissionOutcome,
};
use onboarding_state::fakes::{
    MemoryActionPlanService, MemoryAssignmentStore, MemoryCollaboratorDirectory,
    MemoryMilestoneResultStore, MemoryTemplateCatalog,
};
use onboarding_state::{
    ActionPlan, Answer, AssignmentStore, Collaborator, CollaboratorDirectory, EvaluationTemplate,
    Milestone, MilestoneResult, MilestoneResultStore, Question, QuestionType, SurrealConfig,
    SurrealAssignmentStore, SurrealMilestoneResultStore, TargetRole, TemplateId,
};
use serde::Serialize;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "onboarding")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Onboarding evaluation lifecycle and risk scoring", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Score behind the collaborator's risk level: latest | weighted
    /// (overrides ONBOARDING_RISK_POLICY)
    #[arg(long, global = true)]
    risk_policy: Option<RiskPolicy>,

    /// Assignment dedup key: template | role (overrides ONBOARDING_DEDUP_POLICY)
    #[arg(long, global = true)]
    dedup_policy: Option<DedupPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full DAY_1 → MONTH_1 onboarding against a seeded collaborator
    Demo {
        /// Collaborator answers to the four scale questions, 1-4
        #[arg(long, value_delimiter = ',', default_value = "1,1,1,1")]
        scores: Vec<f64>,

        /// Team leader answers (defaults to the collaborator's)
        #[arg(long, value_delimiter = ',')]
        team_leader_scores: Option<Vec<f64>>,

        /// Where assignments and results are stored
        #[arg(long, value_enum, env = "ONBOARDING_BACKEND", default_value = "memory")]
        backend: Backend,
    },

    /// Print the risk level of a score
    Classify {
        /// Score on the 1-4 scale
        score: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process fakes
    Memory,
    /// SurrealDB, configured by SURREALDB_URL (default mem://)
    Surreal,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    onboarding_core::telemetry::init_tracing(cli.json, level);

    let config = engine_config(&cli)?;

    match cli.command {
        Commands::Demo {
            scores,
            team_leader_scores,
            backend,
        } => {
            let leader = team_leader_scores.unwrap_or_else(|| scores.clone());
            cmd_demo(config, backend, &scores, &leader).await
        }
        Commands::Classify { score } => cmd_classify(score, cli.json),
    }
}

/// Environment first, flags on top.
fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Invalid engine configuration in environment")?;
    if let Some(policy) = cli.risk_policy {
        config = config.with_risk_policy(policy);
    }
    if let Some(policy) = cli.dedup_policy {
        config = config.with_dedup_policy(policy);
    }
    Ok(config)
}

fn cmd_classify(score: f64, json: bool) -> Result<()> {
    let level = classify(score);
    if json {
        let line = serde_json::json!({ "score": score, "risk_level": level });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("{level}");
    }
    Ok(())
}

async fn cmd_demo(
    config: EngineConfig,
    backend: Backend,
    collaborator_scores: &[f64],
    team_leader_scores: &[f64],
) -> Result<()> {
    let report = run_demo(
        config,
        backend,
        collaborator_scores,
        team_leader_scores,
        Utc::now(),
    )
    .await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to encode demo report")?
    );
    METRICS.flush();
    Ok(())
}

/// One submission of the demo run.
#[derive(Debug, Serialize)]
struct DemoStep {
    milestone: Milestone,
    role: TargetRole,
    #[serde(flatten)]
    outcome: SubmissionOutcome,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    config: EngineConfig,
    collaborator: Collaborator,
    steps: Vec<DemoStep>,
    results: Vec<MilestoneResult>,
    action_plans: Vec<ActionPlan>,
    metrics: MetricsSnapshot,
}

/// Demo order: collaborator first, then team leader, per milestone.
const DEMO_SEQUENCE: [(Milestone, TargetRole); 5] = [
    (Milestone::Day1, TargetRole::Collaborator),
    (Milestone::Week1, TargetRole::Collaborator),
    (Milestone::Week1, TargetRole::TeamLeader),
    (Milestone::Month1, TargetRole::Collaborator),
    (Milestone::Month1, TargetRole::TeamLeader),
];

fn demo_template(milestone: Milestone, role: TargetRole) -> EvaluationTemplate {
    EvaluationTemplate::new(
        milestone,
        role,
        format!("{milestone} {} check-in", role.label()),
        vec![
            Question::scale(1, "I feel welcome in the team"),
            Question::scale(2, "I have the tools and access I need"),
            Question::scale(3, "My responsibilities are clear"),
            Question::scale(4, "I know who to ask for help"),
            Question::open_text(5, "Anything else to share?"),
        ],
    )
}

fn demo_answers(template: &EvaluationTemplate, scores: &[f64]) -> Result<Vec<Answer>> {
    let scale: Vec<_> = template
        .questions
        .iter()
        .filter(|q| q.question_type == QuestionType::Scale1To4)
        .collect();
    if scores.len() != scale.len() {
        bail!(
            "expected {} scores for {}, got {}",
            scale.len(),
            template.title,
            scores.len()
        );
    }
    Ok(scale
        .into_iter()
        .zip(scores)
        .map(|(q, score)| Answer::new(q.id, *score))
        .collect())
}

async fn storage(
    backend: Backend,
) -> Result<(Arc<dyn AssignmentStore>, Arc<dyn MilestoneResultStore>)> {
    let stores: (Arc<dyn AssignmentStore>, Arc<dyn MilestoneResultStore>) = match backend {
        Backend::Memory => (
            Arc::new(MemoryAssignmentStore::new()),
            Arc::new(MemoryMilestoneResultStore::new()),
        ),
        Backend::Surreal => {
            let db = onboarding_state::connect(&SurrealConfig::from_env())
                .await
                .context("Failed to connect to onboarding database")?;
            (
                Arc::new(SurrealAssignmentStore::new(db.clone())),
                Arc::new(SurrealMilestoneResultStore::new(db)),
            )
        }
    };
    Ok(stores)
}

async fn run_demo(
    config: EngineConfig,
    backend: Backend,
    collaborator_scores: &[f64],
    team_leader_scores: &[f64],
    now: DateTime<Utc>,
) -> Result<DemoReport> {
    let (assignments, results) = storage(backend).await?;

    let directory = Arc::new(MemoryCollaboratorDirectory::new());
    let collaborator = Collaborator::new(1, "Demo Collaborator", now);
    directory.insert(collaborator.clone());

    let catalog = Arc::new(MemoryTemplateCatalog::new());
    let mut templates: HashMap<TemplateId, EvaluationTemplate> = HashMap::new();
    for (milestone, role) in DEMO_SEQUENCE {
        let template = demo_template(milestone, role);
        catalog.insert(template.clone());
        templates.insert(template.id, template);
    }

    let plans = Arc::new(MemoryActionPlanService::new());
    let ports = EnginePorts {
        collaborators: directory.clone(),
        templates: catalog,
        assignments,
        results,
        action_plans: plans.clone(),
    };
    let engine = OnboardingEngine::new(ports, config);

    let day1 = engine
        .assign_evaluation_at(collaborator.id, Milestone::Day1, now)
        .await
        .context("Failed to assign DAY_1")?;
    info!(created = day1.created.len(), "demo collaborator admitted");

    let mut steps = Vec::with_capacity(DEMO_SEQUENCE.len());
    for (milestone, role) in DEMO_SEQUENCE {
        let pending = engine
            .pending_evaluations(
                PendingFilter::for_collaborator(collaborator.id).with_milestone(milestone),
            )
            .await?;
        let Some((assignment, template)) = pending.iter().find_map(|a| {
            templates
                .get(&a.template_id)
                .filter(|t| t.target_role == role)
                .map(|t| (a, t))
        }) else {
            warn!(milestone = %milestone, role = %role, "no open assignment, skipping");
            continue;
        };

        let scores = match role {
            TargetRole::Collaborator => collaborator_scores,
            TargetRole::TeamLeader => team_leader_scores,
        };
        let outcome = engine
            .submit_at(assignment.id, demo_answers(template, scores)?, None, now)
            .await
            .with_context(|| format!("Failed to submit {milestone} {role}"))?;
        steps.push(DemoStep {
            milestone,
            role,
            outcome,
        });
    }

    let current = engine
        .pending_evaluations(PendingFilter::for_collaborator(collaborator.id))
        .await?;
    if !current.is_empty() {
        warn!(open = current.len(), "demo finished with open assignments");
    }

    Ok(DemoReport {
        config: engine.config().clone(),
        collaborator: directory
            .find_by_id(collaborator.id)
            .await?
            .unwrap_or_else(|| collaborator.clone()),
        steps,
        results: engine.milestone_results(collaborator.id).await?,
        action_plans: plans.plans_for(collaborator.id),
        metrics: METRICS.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use onboarding_state::RiskLevel;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn demo_walks_every_milestone() {
        let report = run_demo(
            EngineConfig::default(),
            Backend::Memory,
            &[4.0, 4.0, 3.0, 3.0],
            &[4.0, 4.0, 4.0, 4.0],
            start(),
        )
        .await
        .unwrap();

        assert_eq!(report.steps.len(), 5);
        assert!(report.steps.iter().all(|s| !s.outcome.cascade.has_failures()));
        let milestones: Vec<_> = report.results.iter().map(|r| r.milestone).collect();
        assert_eq!(milestones, Milestone::ALL.to_vec());
        assert_eq!(report.collaborator.risk_level, RiskLevel::Low);
        assert!(report.action_plans.is_empty());
    }

    #[tokio::test]
    async fn low_scores_open_a_plan() {
        let report = run_demo(
            EngineConfig::default(),
            Backend::Memory,
            &[1.0, 1.0, 1.0, 1.0],
            &[1.0, 2.0, 1.0, 2.0],
            start(),
        )
        .await
        .unwrap();

        assert_eq!(report.collaborator.risk_level, RiskLevel::High);
        assert_eq!(report.action_plans.len(), 1);
        assert!(report
            .results
            .iter()
            .all(|r| r.risk_level == RiskLevel::High));
    }

    #[tokio::test]
    async fn demo_on_embedded_surreal() {
        let report = run_demo(
            EngineConfig::default().with_risk_policy(RiskPolicy::WeightedMilestone),
            Backend::Surreal,
            &[2.0, 2.0, 2.0, 2.0],
            &[4.0, 4.0, 4.0, 4.0],
            start(),
        )
        .await
        .unwrap();

        assert_eq!(report.steps.len(), 5);
        let month1 = report.results.last().unwrap();
        assert_eq!(month1.final_score, 3.2);
        // Weighted policy: (2.0 × 0.4) + (4.0 × 0.6) = 3.2
        assert_eq!(report.collaborator.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn wrong_score_count_is_rejected() {
        let err = run_demo(
            EngineConfig::default(),
            Backend::Memory,
            &[1.0, 2.0],
            &[1.0, 2.0, 3.0, 4.0],
            start(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("expected 4 scores"), "{err:#}");
    }

    #[tokio::test]
    async fn out_of_range_scores_fail_submission() {
        let err = run_demo(
            EngineConfig::default(),
            Backend::Memory,
            &[5.0, 1.0, 1.0, 1.0],
            &[1.0, 1.0, 1.0, 1.0],
            start(),
        )
        .await
        .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to submit DAY_1"), "{err:#}");
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from([
            "onboarding",
            "--risk-policy",
            "weighted",
            "--dedup-policy",
            "role",
            "classify",
            "2.5",
        ]);
        let config = engine_config(&cli).unwrap();
        assert_eq!(config.risk_policy, RiskPolicy::WeightedMilestone);
        assert_eq!(config.dedup_policy, DedupPolicy::ByRole);
    }

    #[test]
    fn demo_scores_parse_as_list() {
        let cli = Cli::parse_from(["onboarding", "demo", "--scores", "1,2,3,4"]);
        let Commands::Demo {
            scores,
            team_leader_scores,
            backend,
        } = cli.command
        else {
            panic!("expected demo");
        };
        assert_eq!(scores, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(team_leader_scores.is_none());
        assert_eq!(backend, Backend::Memory);
    }
}
