use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::database::collections::Collection;
use crate::database::store::{DatabaseError, Document, Store};
use crate::filter::{Filter, FilterData, SqlResult};

/// PostgreSQL-backed store. Rows travel as JSON through `row_to_json` and
/// `jsonb_populate_record` so the typed columns stay authoritative.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;
        info!("Connected to PostgreSQL (max_connections={})", config.max_connections);
        Ok(Self { pool })
    }

    fn filter(collection: &Collection) -> Result<Filter, DatabaseError> {
        Ok(Filter::new(collection.name)?.with_options(collection.where_options()))
    }

    /// Document keys that name real columns, quoted for SQL.
    fn column_list(collection: &Collection, doc: &Document) -> Vec<String> {
        doc.keys()
            .filter(|k| collection.field(k).is_some())
            .map(|k| format!("\"{}\"", k))
            .collect()
    }

    async fn fetch_documents(&self, sql: &SqlResult, leading: Option<Value>) -> Result<Vec<Document>, DatabaseError> {
        debug!("SQL: {} ({} params)", sql.query, sql.params.len());
        let mut q = sqlx::query(&sql.query);
        if let Some(doc) = leading {
            q = q.bind(doc);
        }
        for p in sql.params.iter() {
            q = bind_value(q, p.clone());
        }
        let rows = q.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        rows.iter().map(row_document).collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find(&self, collection: &Collection, query: FilterData) -> Result<Vec<Document>, DatabaseError> {
        let mut filter = Self::filter(collection)?;
        filter.assign(query)?;
        let inner = filter.to_sql()?;
        let sql = SqlResult {
            query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner.query),
            params: inner.params,
        };
        self.fetch_documents(&sql, None).await
    }

    async fn count(&self, collection: &Collection, where_clause: Option<Value>) -> Result<i64, DatabaseError> {
        let mut filter = Self::filter(collection)?;
        if let Some(where_clause) = where_clause {
            filter.where_clause(where_clause)?;
        }
        let sql = filter.to_count_sql()?;
        debug!("SQL: {}", sql.query);

        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_value(q, p.clone());
        }
        let row = q.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, DatabaseError> {
        let columns = Self::column_list(collection, &doc).join(", ");
        if columns.is_empty() {
            return Err(DatabaseError::Validation("Nothing to insert".to_string()));
        }
        let sql = SqlResult {
            query: format!(
                "INSERT INTO \"{table}\" ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1) \
                 RETURNING row_to_json(\"{table}\".*) AS row",
                table = collection.name,
                columns = columns,
            ),
            params: vec![],
        };
        let mut rows = self.fetch_documents(&sql, Some(Value::Object(doc))).await?;
        rows.pop().ok_or_else(|| DatabaseError::Query("INSERT returned no row".to_string()))
    }

    async fn update_where(
        &self,
        collection: &Collection,
        where_clause: Value,
        changes: Document,
    ) -> Result<Vec<Document>, DatabaseError> {
        let columns = Self::column_list(collection, &changes).join(", ");
        if columns.is_empty() {
            return self.find(collection, FilterData::matching(where_clause)).await;
        }

        let mut filter = Self::filter(collection)?;
        filter.where_clause(where_clause)?;
        // $1 is the changes document
        let predicate = filter.to_where_sql(1)?;
        let sql = SqlResult {
            query: format!(
                "UPDATE \"{table}\" SET ({columns}) = (SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1)) \
                 WHERE {predicate} RETURNING row_to_json(\"{table}\".*) AS row",
                table = collection.name,
                columns = columns,
                predicate = predicate.query,
            ),
            params: predicate.params,
        };
        self.fetch_documents(&sql, Some(Value::Object(changes))).await
    }

    async fn delete_where(&self, collection: &Collection, where_clause: Value) -> Result<u64, DatabaseError> {
        let mut filter = Self::filter(collection)?;
        filter.where_clause(where_clause)?;
        let predicate = filter.to_where_sql(0)?;
        let query = format!("DELETE FROM \"{}\" WHERE {}", collection.name, predicate.query);
        debug!("SQL: {}", query);

        let mut q = sqlx::query(&query);
        for p in predicate.params.iter() {
            q = bind_value(q, p.clone());
        }
        let result = q.execute(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

fn row_document(row: &PgRow) -> Result<Document, DatabaseError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(doc) => Ok(doc),
        other => Err(DatabaseError::Query(format!("Expected JSON object row, got {}", other))),
    }
}

fn bind_value(
    q: sqlx::query::Query<'_, Postgres, PgArguments>,
    v: Value,
) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        other => q.bind(other),
    }
}

/// Lifts constraint violations into the store's own error kinds.
fn map_sqlx_error(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(ref db) = err {
        match db.code().as_deref() {
            Some("23505") => {
                return DatabaseError::Duplicate(db.constraint().unwrap_or("unique").to_string());
            }
            Some("23502") | Some("23503") | Some("23514") | Some("22P02") | Some("22003") => {
                return DatabaseError::Validation(db.message().to_string());
            }
            _ => {}
        }
    }
    DatabaseError::Sqlx(err)
}
