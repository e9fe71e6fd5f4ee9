use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::{BatchUpdate, Document, DocumentStore, Query, StoreError};
use crate::config::DatabaseConfig;
use crate::tenant::TenantScope;
use crate::validation::ObjectId;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        firm_id TEXT,
        lawyer_id TEXT NOT NULL,
        body JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_firm_idx ON documents (collection, firm_id)",
    "CREATE INDEX IF NOT EXISTS documents_lawyer_idx ON documents (collection, lawyer_id) WHERE firm_id IS NULL",
    "CREATE INDEX IF NOT EXISTS documents_body_idx ON documents USING GIN (body jsonb_path_ops)",
    r#"
    CREATE TABLE IF NOT EXISTS sequences (
        scope TEXT NOT NULL,
        name TEXT NOT NULL,
        value BIGINT NOT NULL,
        PRIMARY KEY (scope, name)
    )
    "#,
];

const COLUMNS: &str = "id, firm_id, lawyer_id, body, created_at, updated_at";

/// JSONB-backed store: one row per document, tenant columns kept outside the body
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not configured".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await?;

        info!("Connected document store pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Create the documents table and its indexes when missing
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Document store schema is up to date");
        Ok(())
    }
}

/// Scope predicate; always binds the scope id as $2
fn scope_clause(scope: &TenantScope) -> &'static str {
    match scope {
        TenantScope::Firm(_) => "firm_id = $2",
        TenantScope::Solo(_) => "firm_id IS NULL AND lawyer_id = $2",
    }
}

fn scope_id(scope: &TenantScope) -> &str {
    match scope {
        TenantScope::Firm(id) | TenantScope::Solo(id) => id.as_str(),
    }
}

fn is_safe_field(field: &str) -> bool {
    !field.is_empty()
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !field.starts_with(|c: char| c.is_ascii_digit())
}

pub(crate) fn order_clause(query: &Query) -> Result<String, StoreError> {
    let mut parts = Vec::with_capacity(query.sort.len() + 1);
    for spec in &query.sort {
        let expr = match spec.field.as_str() {
            "createdAt" => "created_at".to_string(),
            "updatedAt" => "updated_at".to_string(),
            field if is_safe_field(field) => format!("body -> '{}'", field),
            field => return Err(StoreError::InvalidQuery(format!("Invalid sort field: {}", field))),
        };
        parts.push(format!("{} {}", expr, spec.direction.to_sql()));
    }
    parts.push("id ASC".to_string());
    Ok(format!("ORDER BY {}", parts.join(", ")))
}

pub(crate) fn limit_clause(query: &Query) -> String {
    match query.limit {
        Some(limit) => format!("LIMIT {} OFFSET {}", limit, query.skip),
        None if query.skip > 0 => format!("OFFSET {}", query.skip),
        None => String::new(),
    }
}

fn row_to_document(row: &PgRow) -> Result<Document, StoreError> {
    let parse_id = |column: &str, raw: String| {
        ObjectId::parse(&raw).map_err(|_| StoreError::Corrupt(format!("{} '{}' is not an ObjectId", column, raw)))
    };

    let id: String = row.try_get("id")?;
    let firm_id: Option<String> = row.try_get("firm_id")?;
    let lawyer_id: String = row.try_get("lawyer_id")?;
    let Json(body): Json<Map<String, Value>> = row.try_get("body")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Document {
        id: parse_id("id", id)?,
        firm_id: firm_id.map(|f| parse_id("firm_id", f)).transpose()?,
        lawyer_id: parse_id("lawyer_id", lawyer_id)?,
        body,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, firm_id, lawyer_id, body, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(collection)
        .bind(doc.id.as_str())
        .bind(doc.firm_id.as_ref().map(|f| f.as_str()))
        .bind(doc.lawyer_id.as_str())
        .bind(Json(&doc.body))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(doc)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        scope: &TenantScope,
        id: &ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE collection = $1 AND {} AND id = $3",
            COLUMNS,
            scope_clause(scope)
        );

        let row = sqlx::query(&sql)
            .bind(collection)
            .bind(scope_id(scope))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn find(&self, collection: &str, scope: &TenantScope, query: &Query) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE collection = $1 AND {} AND body @> $3 {} {}",
            COLUMNS,
            scope_clause(scope),
            order_clause(query)?,
            limit_clause(query)
        );

        let rows = sqlx::query(&sql)
            .bind(collection)
            .bind(scope_id(scope))
            .bind(Json(&query.filter))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_document).collect()
    }

    async fn count(
        &self,
        collection: &str,
        scope: &TenantScope,
        filter: &Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM documents WHERE collection = $1 AND {} AND body @> $3",
            scope_clause(scope)
        );

        let row = sqlx::query(&sql)
            .bind(collection)
            .bind(scope_id(scope))
            .bind(Json(filter))
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn update(
        &self,
        collection: &str,
        scope: &TenantScope,
        id: &ObjectId,
        patch: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "UPDATE documents SET body = body || $4, updated_at = $5
             WHERE collection = $1 AND {} AND id = $3
             RETURNING {}",
            scope_clause(scope),
            COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(collection)
            .bind(scope_id(scope))
            .bind(id.as_str())
            .bind(Json(&patch))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn delete(&self, collection: &str, scope: &TenantScope, id: &ObjectId) -> Result<bool, StoreError> {
        let sql = format!(
            "DELETE FROM documents WHERE collection = $1 AND {} AND id = $3",
            scope_clause(scope)
        );

        let result = sqlx::query(&sql)
            .bind(collection)
            .bind(scope_id(scope))
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_batch(&self, scope: &TenantScope, batch: Vec<BatchUpdate>) -> Result<(), StoreError> {
        let lock_sql = format!(
            "SELECT body FROM documents WHERE collection = $1 AND {} AND id = $3 FOR UPDATE",
            scope_clause(scope)
        );
        let update_sql = format!(
            "UPDATE documents SET body = body || $4, updated_at = $5
             WHERE collection = $1 AND {} AND id = $3",
            scope_clause(scope)
        );
        let now = Utc::now();

        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;
        for update in &batch {
            let row = sqlx::query(&lock_sql)
                .bind(&update.collection)
                .bind(scope_id(scope))
                .bind(update.id.as_str())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("{} {}", update.collection, update.id)))?;
            let Json(body): Json<Map<String, Value>> = row.try_get("body")?;
            update.check(&body)?;

            sqlx::query(&update_sql)
                .bind(&update.collection)
                .bind(scope_id(scope))
                .bind(update.id.as_str())
                .bind(Json(&update.patch))
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn next_sequence(&self, scope: &TenantScope, name: &str) -> Result<u64, StoreError> {
        let row = sqlx::query(
            "INSERT INTO sequences (scope, name, value) VALUES ($1, $2, 1)
             ON CONFLICT (scope, name) DO UPDATE SET value = sequences.value + 1
             RETURNING value",
        )
        .bind(scope.to_string())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        let value: i64 = row.try_get("value")?;
        Ok(value.max(0) as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
