//! SurrealDB-backed AssignmentStore and MilestoneResultStore
//!
//! Uses `schema::AssignmentRow` and `schema::MilestoneResultRow` for
//! persistence, converting to/from `records` types at the boundary. Unique
//! index violations surface as `StorageError::Conflict`.

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::debug;

use crate::error::StorageError;
use crate::handle::{self, SurrealConfig};
use crate::records::{AssignmentId, EvaluationAssignment, InternalId, Milestone, MilestoneResult};
use crate::schema::{AssignmentRow, MilestoneResultRow};
use crate::storage_traits::{AssignmentStore, MilestoneResultStore, StorageResult};

const ASSIGNMENTS: &str = "evaluation_assignments";
const RESULTS: &str = "milestone_results";

fn backend(err: surrealdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// Map a failed write to `Conflict` when a unique index rejected it.
fn write_error(entity: &'static str, err: surrealdb::Error) -> StorageError {
    let message = err.to_string();
    if message.contains("already contains") || message.contains("already exists") {
        StorageError::conflict(entity, message)
    } else {
        StorageError::Backend(message)
    }
}

// ---------------------------------------------------------------------------
// SurrealAssignmentStore
// ---------------------------------------------------------------------------

/// SurrealDB-backed implementation of [`AssignmentStore`].
#[derive(Clone)]
pub struct SurrealAssignmentStore {
    db: Surreal<Any>,
}

impl SurrealAssignmentStore {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = handle::connect(&SurrealConfig::in_memory()).await?;
        Ok(Self { db })
    }

    async fn select(
        &self,
        sql: &'static str,
        bindings: Vec<(&'static str, serde_json::Value)>,
    ) -> StorageResult<Vec<EvaluationAssignment>> {
        let mut query = self.db.query(sql);
        for binding in bindings {
            query = query.bind(binding);
        }
        let mut res = query.await.map_err(backend)?;
        let rows: Vec<AssignmentRow> = res.take(0).map_err(backend)?;
        rows.into_iter().map(AssignmentRow::into_record).collect()
    }
}

#[async_trait]
impl AssignmentStore for SurrealAssignmentStore {
    async fn save(&self, assignment: &EvaluationAssignment) -> StorageResult<()> {
        let row = AssignmentRow::from_record(assignment)?;
        let aid = assignment.id.to_string();
        let exists = self.find_by_id(assignment.id).await?.is_some();

        debug!(assignment_id = %aid, exists, "saving assignment");

        let sql = if exists {
            "UPDATE type::thing($tb, $aid) CONTENT $row"
        } else {
            "CREATE type::thing($tb, $aid) CONTENT $row"
        };

        self.db
            .query(sql)
            .bind(("tb", ASSIGNMENTS))
            .bind(("aid", aid))
            .bind(("row", row))
            .await
            .map_err(backend)?
            .check()
            .map_err(|e| write_error("assignment", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: AssignmentId) -> StorageResult<Option<EvaluationAssignment>> {
        let found = self
            .select(
                "SELECT * FROM evaluation_assignments WHERE assignment_id = $aid",
                vec![("aid", serde_json::Value::String(id.to_string()))],
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_by_collaborator_id(
        &self,
        collaborator: InternalId,
    ) -> StorageResult<Vec<EvaluationAssignment>> {
        self.select(
            "SELECT * FROM evaluation_assignments \
             WHERE collaborator_internal_id = $cid ORDER BY created_at ASC",
            vec![("cid", serde_json::Value::from(collaborator.0))],
        )
        .await
    }

    async fn find_by_collaborator_and_milestone(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
    ) -> StorageResult<Vec<EvaluationAssignment>> {
        self.select(
            "SELECT * FROM evaluation_assignments \
             WHERE collaborator_internal_id = $cid AND milestone = $milestone \
             ORDER BY created_at ASC",
            vec![
                ("cid", serde_json::Value::from(collaborator.0)),
                ("milestone", serde_json::Value::from(milestone.as_str())),
            ],
        )
        .await
    }

    async fn find_all_pending(&self) -> StorageResult<Vec<EvaluationAssignment>> {
        self.select(
            "SELECT * FROM evaluation_assignments \
             WHERE status = 'PENDING' OR status = 'IN_PROGRESS' ORDER BY created_at ASC",
            Vec::new(),
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// SurrealMilestoneResultStore
// ---------------------------------------------------------------------------

/// SurrealDB-backed implementation of [`MilestoneResultStore`].
#[derive(Clone)]
pub struct SurrealMilestoneResultStore {
    db: Surreal<Any>,
}

impl SurrealMilestoneResultStore {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = handle::connect(&SurrealConfig::in_memory()).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl MilestoneResultStore for SurrealMilestoneResultStore {
    async fn save(&self, result: &MilestoneResult) -> StorageResult<()> {
        let row = MilestoneResultRow::from_record(result);
        let rid = result.id.to_string();

        debug!(result_id = %rid, milestone = %result.milestone, "saving milestone result");

        self.db
            .query("CREATE type::thing($tb, $rid) CONTENT $row")
            .bind(("tb", RESULTS))
            .bind(("rid", rid))
            .bind(("row", row))
            .await
            .map_err(backend)?
            .check()
            .map_err(|e| write_error("milestone_result", e))?;

        Ok(())
    }

    async fn find_by_collaborator_and_milestone(
        &self,
        collaborator: InternalId,
        milestone: Milestone,
    ) -> StorageResult<Option<MilestoneResult>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM milestone_results \
                 WHERE collaborator_internal_id = $cid AND milestone = $milestone",
            )
            .bind(("cid", collaborator.0))
            .bind(("milestone", milestone.as_str()))
            .await
            .map_err(backend)?;

        let rows: Vec<MilestoneResultRow> = res.take(0).map_err(backend)?;
        rows.into_iter()
            .next()
            .map(MilestoneResultRow::into_record)
            .transpose()
    }

    async fn find_by_collaborator(
        &self,
        collaborator: InternalId,
    ) -> StorageResult<Vec<MilestoneResult>> {
        let mut res = self
            .db
            .query("SELECT * FROM milestone_results WHERE collaborator_internal_id = $cid")
            .bind(("cid", collaborator.0))
            .await
            .map_err(backend)?;

        let rows: Vec<MilestoneResultRow> = res.take(0).map_err(backend)?;
        let mut results = rows
            .into_iter()
            .map(MilestoneResultRow::into_record)
            .collect::<StorageResult<Vec<_>>>()?;
        results.sort_by_key(|r| r.milestone);
        Ok(results)
    }
}
