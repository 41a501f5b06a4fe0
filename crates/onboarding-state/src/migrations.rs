//! SurrealDB schema migrations and initialization
//!
//! Sets up the tables the engine owns, with the unique indexes that back the
//! "one assignment per template" and "one result per milestone" invariants
//! when concurrent requests race past the engine's read-then-write checks.

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all onboarding tables in SurrealDB.
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing onboarding SurrealDB schema");

    init_assignments_table(db).await?;
    init_milestone_results_table(db).await?;

    info!("Onboarding schema initialization complete");
    Ok(())
}

/// Initialize `evaluation_assignments`
///
/// Schema:
/// ```text
/// TABLE evaluation_assignments {
///   assignment_id:            STRING (unique, also the record id)
///   collaborator_internal_id: INT
///   evaluator_user_id:        STRING?
///   template_id:              STRING
///   milestone:                STRING (DAY_1 | WEEK_1 | MONTH_1)
///   status:                   STRING (PENDING | IN_PROGRESS | COMPLETED)
///   due_date:                 DATETIME
///   completed_at:             DATETIME?
///   answers:                  ARRAY
///   score:                    FLOAT?
///   created_at:               DATETIME
///   updated_at:               DATETIME
/// }
/// ```
///
/// Constraints:
/// - `(collaborator_internal_id, template_id)` is unique
/// - status transitions are enforced by the engine
async fn init_assignments_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing evaluation_assignments table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS evaluation_assignments SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_assignment_id
            ON TABLE evaluation_assignments COLUMNS assignment_id UNIQUE;

        -- One assignment per (collaborator, template)
        DEFINE INDEX IF NOT EXISTS idx_assignment_collaborator_template
            ON TABLE evaluation_assignments COLUMNS collaborator_internal_id, template_id UNIQUE;

        -- Milestone lookups for aggregation and advancement
        DEFINE INDEX IF NOT EXISTS idx_assignment_collaborator_milestone
            ON TABLE evaluation_assignments COLUMNS collaborator_internal_id, milestone;

        -- Pending listings
        DEFINE INDEX IF NOT EXISTS idx_assignment_status
            ON TABLE evaluation_assignments COLUMNS status;
    "#;

    db.query(sql)
        .await?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    info!("✓ evaluation_assignments table initialized");
    Ok(())
}

/// Initialize `milestone_results`
///
/// Constraints:
/// - `(collaborator_internal_id, milestone)` is unique
/// - rows are never updated (the store only ever creates)
async fn init_milestone_results_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing milestone_results table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS milestone_results SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_result_collaborator_milestone
            ON TABLE milestone_results COLUMNS collaborator_internal_id, milestone UNIQUE;
    "#;

    db.query(sql)
        .await?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    info!("✓ milestone_results table initialized");
    Ok(())
}
