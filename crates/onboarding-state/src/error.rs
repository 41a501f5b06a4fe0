//! Error types for onboarding-state

use thiserror::Error;

/// Errors raised while connecting to or preparing the database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Errors returned by the storage and port traits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The requested record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness or single-active invariant rejected the write
    #[error("{entity} conflict: {detail}")]
    Conflict { entity: &'static str, detail: String },

    /// Backend failure (connection, query, decode)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StorageError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, detail: impl Into<String>) -> Self {
        StorageError::Conflict {
            entity,
            detail: detail.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}
