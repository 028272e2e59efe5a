use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::collections::Collection;
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgStore;
use crate::filter::{FilterData, FilterError};

/// A stored row as a JSON object keyed by column name.
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Malformed document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Document-style storage the resource layer runs against. `where` clauses
/// use the `FilterData` operator syntax.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find(&self, collection: &Collection, query: FilterData) -> Result<Vec<Document>, DatabaseError>;

    async fn count(&self, collection: &Collection, where_clause: Option<Value>) -> Result<i64, DatabaseError>;

    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, DatabaseError>;

    /// Applies `changes` to every matching document in one atomic step and
    /// returns the updated documents.
    async fn update_where(
        &self,
        collection: &Collection,
        where_clause: Value,
        changes: Document,
    ) -> Result<Vec<Document>, DatabaseError>;

    async fn delete_where(&self, collection: &Collection, where_clause: Value) -> Result<u64, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn migrate(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Opens the store named by `database.url`: `memory://` for the in-process
/// store, anything else is treated as a PostgreSQL connection string.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, DatabaseError> {
    if config.url.is_empty() {
        return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
    }
    let url = url::Url::parse(&config.url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    match url.scheme() {
        "memory" => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        "postgres" | "postgresql" => Ok(Arc::new(PgStore::connect(config).await?)),
        _ => Err(DatabaseError::InvalidDatabaseUrl),
    }
}
