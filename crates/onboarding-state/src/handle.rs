//! SurrealDB connection configuration and setup

use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{info, instrument};

use crate::error::StateError;
use crate::migrations;
use crate::Result;

/// Connection settings for the SurrealDB backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurrealConfig {
    /// Endpoint URL (`mem://`, `surrealkv://path`, `ws://host:port`, ...)
    pub endpoint: String,
    /// Namespace (default: "onboarding")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Root credentials, when the endpoint requires sign-in
    pub credentials: Option<(String, String)>,
}

impl Default for SurrealConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl SurrealConfig {
    /// Embedded in-memory database.
    pub fn in_memory() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "onboarding".to_string(),
            database: "main".to_string(),
            credentials: None,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_URL (optional, default: "mem://")
    /// - SURREALDB_NAMESPACE (optional, default: "onboarding")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_USERNAME / SURREALDB_PASSWORD (optional, root sign-in when both set)
    pub fn from_env() -> Self {
        let defaults = Self::in_memory();
        let endpoint = std::env::var("SURREALDB_URL").unwrap_or(defaults.endpoint);
        let namespace = std::env::var("SURREALDB_NAMESPACE").unwrap_or(defaults.namespace);
        let database = std::env::var("SURREALDB_DATABASE").unwrap_or(defaults.database);
        let credentials = match (
            std::env::var("SURREALDB_USERNAME"),
            std::env::var("SURREALDB_PASSWORD"),
        ) {
            (Ok(user), Ok(pass)) => Some((user, pass)),
            _ => None,
        };

        Self {
            endpoint,
            namespace,
            database,
            credentials,
        }
    }
}

/// Connect, sign in if configured, select namespace/database and run
/// migrations. The returned handle is cheap to clone and can back several
/// stores at once.
#[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
pub async fn connect(config: &SurrealConfig) -> Result<Surreal<Any>> {
    let db = surrealdb::engine::any::connect(config.endpoint.as_str())
        .await
        .map_err(|e| {
            StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
        })?;

    if let Some((username, password)) = &config.credentials {
        db.signin(Root {
            username: username.as_str(),
            password: password.as_str(),
        })
        .await
        .map_err(|e| StateError::Connection(format!("Root authentication failed: {}", e)))?;
    }

    db.use_ns(config.namespace.as_str())
        .use_db(config.database.as_str())
        .await
        .map_err(|e| StateError::Connection(e.to_string()))?;

    migrations::init_schema(&db).await?;

    info!("SurrealDB connected and schema initialized");
    Ok(db)
}
