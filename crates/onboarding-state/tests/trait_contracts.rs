//! Trait contract tests for AssignmentStore, MilestoneResultStore,
//! ActionPlanService, TemplateCatalog and CollaboratorDirectory.
//!
//! Assignment and result contracts run against both the in-memory fakes and
//! the SurrealDB `mem://` stores. Any conforming implementation must pass.

use chrono::{Duration, Utc};
use onboarding_state::fakes::{
    MemoryActionPlanService, MemoryAssignmentStore, MemoryCollaboratorDirectory,
    MemoryMilestoneResultStore, MemoryTemplateCatalog,
};
use onboarding_state::storage_traits::*;
use onboarding_state::{
    ActionPlanType, Answer, AssignmentId, Collaborator, CollaboratorId, EvaluationAssignment,
    EvaluationTemplate, InternalId, Milestone, MilestoneResult, NewActionPlan, Question,
    QuestionId, ResultId, RiskLevel, StorageError, SurrealAssignmentStore,
    SurrealMilestoneResultStore, TargetRole, TemplateId,
};

fn pending(collaborator: i64, template: TemplateId, milestone: Milestone) -> EvaluationAssignment {
    let now = Utc::now();
    EvaluationAssignment::pending(
        InternalId(collaborator),
        template,
        milestone,
        now + Duration::days(1),
        now,
    )
}

fn result(collaborator: i64, milestone: Milestone, score: f64) -> MilestoneResult {
    MilestoneResult {
        id: ResultId::new(),
        collaborator_id: InternalId(collaborator),
        milestone,
        collaborator_assignment_id: Some(AssignmentId::new()),
        team_leader_assignment_id: None,
        final_score: score,
        risk_level: RiskLevel::Low,
        calculation_formula: format!("Average(Collaborator) = {score:.1}"),
        calculated_at: Utc::now(),
    }
}

// ===========================================================================
// AssignmentStore contracts (shared by every backend)
// ===========================================================================

async fn assignment_save_and_find(store: &dyn AssignmentStore) {
    let assignment = pending(1, TemplateId::new(), Milestone::Day1);
    store.save(&assignment).await.unwrap();

    let found = store.find_by_id(assignment.id).await.unwrap();
    assert_eq!(found, Some(assignment));
}

async fn assignment_missing_is_none(store: &dyn AssignmentStore) {
    let found = store.find_by_id(AssignmentId::new()).await.unwrap();
    assert!(found.is_none());
}

async fn assignment_save_replaces_by_id(store: &dyn AssignmentStore) {
    let assignment = pending(2, TemplateId::new(), Milestone::Day1);
    store.save(&assignment).await.unwrap();

    let completed = assignment.clone().complete(
        vec![Answer::new(QuestionId::new(), 4.0)],
        4.0,
        None,
        Utc::now(),
    );
    store.save(&completed).await.unwrap();

    let found = store.find_by_id(assignment.id).await.unwrap().unwrap();
    assert_eq!(found.score, Some(4.0));
    assert_eq!(
        store
            .find_by_collaborator_id(InternalId(2))
            .await
            .unwrap()
            .len(),
        1
    );
}

async fn assignment_duplicate_template_conflicts(store: &dyn AssignmentStore) {
    let template = TemplateId::new();
    store
        .save(&pending(3, template, Milestone::Week1))
        .await
        .unwrap();

    let err = store
        .save(&pending(3, template, Milestone::Week1))
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "expected conflict, got {err:?}");
}

async fn assignment_listings_filter(store: &dyn AssignmentStore) {
    let day1 = pending(4, TemplateId::new(), Milestone::Day1);
    let week1 = pending(4, TemplateId::new(), Milestone::Week1);
    let other = pending(5, TemplateId::new(), Milestone::Day1);
    for a in [&day1, &week1, &other] {
        store.save(a).await.unwrap();
    }
    let done = day1.clone().complete(Vec::new(), 0.0, None, Utc::now());
    store.save(&done).await.unwrap();

    let all_four = store.find_by_collaborator_id(InternalId(4)).await.unwrap();
    assert_eq!(all_four.len(), 2);

    let week = store
        .find_by_collaborator_and_milestone(InternalId(4), Milestone::Week1)
        .await
        .unwrap();
    assert_eq!(week.len(), 1);
    assert_eq!(week[0].id, week1.id);

    let pending_ids: Vec<AssignmentId> = store
        .find_all_pending()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert!(pending_ids.contains(&week1.id));
    assert!(pending_ids.contains(&other.id));
    assert!(!pending_ids.contains(&day1.id));
}

async fn run_assignment_contracts(store: &dyn AssignmentStore) {
    assignment_save_and_find(store).await;
    assignment_missing_is_none(store).await;
    assignment_save_replaces_by_id(store).await;
    assignment_duplicate_template_conflicts(store).await;
    assignment_listings_filter(store).await;
}

// ===========================================================================
// MilestoneResultStore contracts
// ===========================================================================

async fn result_save_and_find(store: &dyn MilestoneResultStore) {
    let saved = result(10, Milestone::Day1, 3.5);
    store.save(&saved).await.unwrap();

    let found = store
        .find_by_collaborator_and_milestone(InternalId(10), Milestone::Day1)
        .await
        .unwrap();
    assert_eq!(found, Some(saved));

    let missing = store
        .find_by_collaborator_and_milestone(InternalId(10), Milestone::Week1)
        .await
        .unwrap();
    assert!(missing.is_none());
}

async fn result_second_save_conflicts(store: &dyn MilestoneResultStore) {
    store
        .save(&result(11, Milestone::Week1, 2.0))
        .await
        .unwrap();
    let err = store
        .save(&result(11, Milestone::Week1, 4.0))
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "expected conflict, got {err:?}");

    let kept = store
        .find_by_collaborator_and_milestone(InternalId(11), Milestone::Week1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.final_score, 2.0);
}

async fn result_listing_is_milestone_ordered(store: &dyn MilestoneResultStore) {
    for milestone in [Milestone::Month1, Milestone::Day1, Milestone::Week1] {
        store.save(&result(12, milestone, 3.0)).await.unwrap();
    }
    let milestones: Vec<Milestone> = store
        .find_by_collaborator(InternalId(12))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.milestone)
        .collect();
    assert_eq!(milestones, Milestone::ALL.to_vec());
}

async fn run_result_contracts(store: &dyn MilestoneResultStore) {
    result_save_and_find(store).await;
    result_second_save_conflicts(store).await;
    result_listing_is_milestone_ordered(store).await;
}

// ===========================================================================
// Backends
// ===========================================================================

#[tokio::test]
async fn memory_assignment_store_contracts() {
    run_assignment_contracts(&MemoryAssignmentStore::new()).await;
}

#[tokio::test]
async fn memory_result_store_contracts() {
    run_result_contracts(&MemoryMilestoneResultStore::new()).await;
}

#[tokio::test]
async fn surreal_assignment_store_contracts() {
    let store = SurrealAssignmentStore::in_memory()
        .await
        .expect("in_memory() failed");
    run_assignment_contracts(&store).await;
}

#[tokio::test]
async fn surreal_result_store_contracts() {
    let store = SurrealMilestoneResultStore::in_memory()
        .await
        .expect("in_memory() failed");
    run_result_contracts(&store).await;
}

// ===========================================================================
// External port fakes
// ===========================================================================

#[tokio::test]
async fn action_plan_service_allows_one_active_plan() {
    let service = MemoryActionPlanService::new();
    let collaborator = CollaboratorId::new();
    let request = NewActionPlan {
        collaborator_id: collaborator,
        plan_type: ActionPlanType::Pd30,
        description: "plan".to_string(),
        goals: vec!["goal".to_string()],
        due_date: Utc::now() + Duration::days(30),
    };

    let plan = service.assign(request.clone()).await.unwrap();
    assert_eq!(
        service.find_active(collaborator).await.unwrap(),
        Some(plan.clone())
    );

    let err = service.assign(request.clone()).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict { .. }));

    service.complete_active(collaborator);
    assert!(service.find_active(collaborator).await.unwrap().is_none());
    service.assign(request).await.unwrap();
    assert_eq!(service.plans_for(collaborator).len(), 2);
}

#[tokio::test]
async fn template_catalog_resolves_highest_active_version() {
    let catalog = MemoryTemplateCatalog::new();
    let v1 = EvaluationTemplate::new(
        Milestone::Week1,
        TargetRole::TeamLeader,
        "Week 1 leader check-in",
        vec![Question::scale(1, "Integration with the team")],
    );
    let mut v2 = v1.clone();
    v2.id = TemplateId::new();
    v2.version = 2;
    catalog.insert(v1.clone());
    catalog.insert(v2.clone());

    let active = catalog
        .find_active_by_milestone_and_role(Milestone::Week1, TargetRole::TeamLeader)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, v2.id);

    catalog.deactivate(v2.id);
    let active = catalog
        .find_active_by_milestone_and_role(Milestone::Week1, TargetRole::TeamLeader)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, v1.id);

    assert!(catalog
        .find_active_by_milestone_and_role(Milestone::Week1, TargetRole::Collaborator)
        .await
        .unwrap()
        .is_none());
    assert!(catalog.find_by_id(v2.id).await.unwrap().is_some());
}

#[tokio::test]
async fn collaborator_directory_finds_by_both_ids() {
    let directory = MemoryCollaboratorDirectory::new();
    let mut collaborator = Collaborator::new(77, "Avery Lee", Utc::now());
    directory.insert(collaborator.clone());

    let by_internal = directory
        .find_by_internal_id(InternalId(77))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_internal.id, collaborator.id);

    collaborator.update_risk_level(RiskLevel::High, Utc::now());
    directory.save(&collaborator).await.unwrap();
    let by_id = directory.find_by_id(collaborator.id).await.unwrap().unwrap();
    assert_eq!(by_id.risk_level, RiskLevel::High);

    assert!(directory
        .find_by_internal_id(InternalId(78))
        .await
        .unwrap()
        .is_none());
}
