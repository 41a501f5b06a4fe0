//! Row definitions for the onboarding SurrealDB tables
//!
//! Tables:
//! - evaluation_assignments: one row per assignment, record id = assignment id
//! - milestone_results: one row per (collaborator, milestone)
//!
//! Identifiers and enums are stored as strings; answers are stored as a JSON
//! array. Conversion to and from the `records` types happens at this
//! boundary so nothing else needs to know the row shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::records::{
    Answer, AssignmentId, EvaluationAssignment, InternalId, MilestoneResult, ResultId,
    TemplateId, UserId,
};
use crate::storage_traits::StorageResult;

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Module for serializing optional chrono DateTime to SurrealDB datetime format
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let sd = SurrealDatetime::from(*d);
                serde::Serialize::serialize(&Some(sd), serializer)
            }
            None => serde::Serialize::serialize(&None::<SurrealDatetime>, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

fn decode<T>(field: &str, raw: &str) -> StorageResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| StorageError::Backend(format!("invalid {field} '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// evaluation_assignments
// ---------------------------------------------------------------------------

/// Row in `evaluation_assignments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing)]
    pub id: Option<surrealdb::sql::Thing>,
    pub assignment_id: String,
    pub collaborator_internal_id: i64,
    #[serde(default)]
    pub evaluator_user_id: Option<String>,
    pub template_id: String,
    /// "DAY_1" | "WEEK_1" | "MONTH_1"
    pub milestone: String,
    /// "PENDING" | "IN_PROGRESS" | "COMPLETED"
    pub status: String,
    #[serde(with = "surreal_datetime")]
    pub due_date: DateTime<Utc>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub completed_at: Option<DateTime<Utc>>,
    /// JSON array of `{question_id, value}`
    pub answers: serde_json::Value,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "surreal_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl AssignmentRow {
    pub fn from_record(record: &EvaluationAssignment) -> StorageResult<Self> {
        let answers = serde_json::to_value(&record.answers)
            .map_err(|e| StorageError::Backend(format!("encode answers: {e}")))?;
        Ok(Self {
            id: None,
            assignment_id: record.id.to_string(),
            collaborator_internal_id: record.collaborator_id.0,
            evaluator_user_id: record.evaluator_user_id.map(|u| u.to_string()),
            template_id: record.template_id.to_string(),
            milestone: record.milestone.as_str().to_string(),
            status: record.status.as_str().to_string(),
            due_date: record.due_date,
            completed_at: record.completed_at,
            answers,
            score: record.score,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    pub fn into_record(self) -> StorageResult<EvaluationAssignment> {
        let answers: Vec<Answer> = serde_json::from_value(self.answers)
            .map_err(|e| StorageError::Backend(format!("decode answers: {e}")))?;
        let evaluator_user_id = self
            .evaluator_user_id
            .as_deref()
            .map(|raw| decode::<UserId>("evaluator_user_id", raw))
            .transpose()?;

        Ok(EvaluationAssignment {
            id: decode::<AssignmentId>("assignment_id", &self.assignment_id)?,
            collaborator_id: InternalId(self.collaborator_internal_id),
            evaluator_user_id,
            template_id: decode::<TemplateId>("template_id", &self.template_id)?,
            milestone: decode("milestone", &self.milestone)?,
            status: decode("status", &self.status)?,
            due_date: self.due_date,
            completed_at: self.completed_at,
            answers,
            score: self.score,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// milestone_results
// ---------------------------------------------------------------------------

/// Row in `milestone_results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneResultRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing)]
    pub id: Option<surrealdb::sql::Thing>,
    pub result_id: String,
    pub collaborator_internal_id: i64,
    pub milestone: String,
    #[serde(default)]
    pub collaborator_assignment_id: Option<String>,
    #[serde(default)]
    pub team_leader_assignment_id: Option<String>,
    pub final_score: f64,
    /// "HIGH" | "MEDIUM" | "LOW" | "NONE"
    pub risk_level: String,
    pub calculation_formula: String,
    #[serde(with = "surreal_datetime")]
    pub calculated_at: DateTime<Utc>,
}

impl MilestoneResultRow {
    pub fn from_record(record: &MilestoneResult) -> Self {
        Self {
            id: None,
            result_id: record.id.to_string(),
            collaborator_internal_id: record.collaborator_id.0,
            milestone: record.milestone.as_str().to_string(),
            collaborator_assignment_id: record.collaborator_assignment_id.map(|a| a.to_string()),
            team_leader_assignment_id: record.team_leader_assignment_id.map(|a| a.to_string()),
            final_score: record.final_score,
            risk_level: record.risk_level.as_str().to_string(),
            calculation_formula: record.calculation_formula.clone(),
            calculated_at: record.calculated_at,
        }
    }

    pub fn into_record(self) -> StorageResult<MilestoneResult> {
        let collaborator_assignment_id = self
            .collaborator_assignment_id
            .as_deref()
            .map(|raw| decode::<AssignmentId>("collaborator_assignment_id", raw))
            .transpose()?;
        let team_leader_assignment_id = self
            .team_leader_assignment_id
            .as_deref()
            .map(|raw| decode::<AssignmentId>("team_leader_assignment_id", raw))
            .transpose()?;

        Ok(MilestoneResult {
            id: decode::<ResultId>("result_id", &self.result_id)?,
            collaborator_id: InternalId(self.collaborator_internal_id),
            milestone: decode("milestone", &self.milestone)?,
            collaborator_assignment_id,
            team_leader_assignment_id,
            final_score: self.final_score,
            risk_level: decode("risk_level", &self.risk_level)?,
            calculation_formula: self.calculation_formula,
            calculated_at: self.calculated_at,
        })
    }
}
