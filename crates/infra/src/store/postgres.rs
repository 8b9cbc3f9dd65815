//! Postgres-backed document store.
//!
//! Documents live in one JSONB table keyed by `(tenant_id, collection, id)`.
//! Per-tenant unique keys are a partial unique index; versions are checked
//! and bumped inside the `UPDATE` statement itself.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | any other | `Backend` |
//! | PoolClosed / network / other | N/A | `Backend` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use invoicefy_core::{AggregateId, ExpectedVersion, TenantId};

use super::{DocumentKey, DocumentStore, StoreError, StoredDocument, version_conflict};

/// Schema applied at start-up (idempotent).
pub const SCHEMA: &str = include_str!("../../migrations/0001_documents.sql");

/// Open a pool and apply the schema.
pub async fn connect_postgres(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;

    tracing::info!("postgres schema applied");
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn current_version(&self, key: DocumentKey) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query(
            "SELECT version FROM documents WHERE tenant_id = $1 AND collection = $2 AND id = $3",
        )
        .bind(key.tenant_id.as_uuid())
        .bind(key.collection)
        .bind(key.id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("current_version", e))?;

        row.map(|r| {
            r.try_get::<i64, _>("version")
                .map(|v| v as u64)
                .map_err(|e| StoreError::Backend(format!("failed to read version: {e}")))
        })
        .transpose()
    }

    /// An `UPDATE ... RETURNING` matched nothing: tell "missing" from "stale".
    async fn explain_no_match(&self, key: DocumentKey, expected: ExpectedVersion) -> StoreError {
        match self.current_version(key).await {
            Ok(None) => StoreError::NotFound,
            Ok(Some(actual)) => version_conflict(expected, actual),
            Err(e) => e,
        }
    }
}

fn expected_param(expected: ExpectedVersion) -> Option<i64> {
    match expected {
        ExpectedVersion::Any => None,
        ExpectedVersion::Exact(v) => Some(v as i64),
    }
}

#[async_trait::async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self, body), fields(key = %key), err)]
    async fn insert(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
    ) -> Result<StoredDocument, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO documents (tenant_id, collection, id, unique_key, version, body)
            VALUES ($1, $2, $3, $4, 1, $5)
            RETURNING id, unique_key, version, body, created_at, updated_at
            "#,
        )
        .bind(key.tenant_id.as_uuid())
        .bind(key.collection)
        .bind(key.id.as_uuid())
        .bind(unique_key.as_deref())
        .bind(&body)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_document", e))?;

        document_from_row(key, &row)
    }

    #[instrument(skip(self, body), fields(key = %key, expected = ?expected), err)]
    async fn replace(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET unique_key = $4, body = $5, version = version + 1, updated_at = now()
            WHERE tenant_id = $1 AND collection = $2 AND id = $3
                AND ($6::bigint IS NULL OR version = $6)
            RETURNING id, unique_key, version, body, created_at, updated_at
            "#,
        )
        .bind(key.tenant_id.as_uuid())
        .bind(key.collection)
        .bind(key.id.as_uuid())
        .bind(unique_key.as_deref())
        .bind(&body)
        .bind(expected_param(expected))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("replace_document", e))?;

        match row {
            Some(row) => document_from_row(key, &row),
            None => Err(self.explain_no_match(key, expected).await),
        }
    }

    #[instrument(skip(self, fields), fields(key = %key, expected = ?expected), err)]
    async fn patch(
        &self,
        key: DocumentKey,
        fields: Map<String, JsonValue>,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET body = body || $4, version = version + 1, updated_at = now()
            WHERE tenant_id = $1 AND collection = $2 AND id = $3
                AND ($5::bigint IS NULL OR version = $5)
            RETURNING id, unique_key, version, body, created_at, updated_at
            "#,
        )
        .bind(key.tenant_id.as_uuid())
        .bind(key.collection)
        .bind(key.id.as_uuid())
        .bind(JsonValue::Object(fields))
        .bind(expected_param(expected))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("patch_document", e))?;

        match row {
            Some(row) => document_from_row(key, &row),
            None => Err(self.explain_no_match(key, expected).await),
        }
    }

    async fn get(&self, key: DocumentKey) -> Result<Option<StoredDocument>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, unique_key, version, body, created_at, updated_at
            FROM documents
            WHERE tenant_id = $1 AND collection = $2 AND id = $3
            "#,
        )
        .bind(key.tenant_id.as_uuid())
        .bind(key.collection)
        .bind(key.id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_document", e))?;

        row.map(|r| document_from_row(key, &r)).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id.as_uuid()), err)]
    async fn list(
        &self,
        tenant_id: TenantId,
        collection: &'static str,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, unique_key, version, body, created_at, updated_at
            FROM documents
            WHERE tenant_id = $1 AND collection = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(collection)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_documents", e))?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row
                .try_get("id")
                .map_err(|e| StoreError::Backend(format!("failed to read id: {e}")))?;
            let key = DocumentKey::new(tenant_id, collection, AggregateId::from_uuid(id));
            docs.push(document_from_row(key, &row)?);
        }
        Ok(docs)
    }

    #[instrument(skip(self), fields(key = %key), err)]
    async fn delete(&self, key: DocumentKey) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM documents WHERE tenant_id = $1 AND collection = $2 AND id = $3",
        )
        .bind(key.tenant_id.as_uuid())
        .bind(key.collection)
        .bind(key.id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_document", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn next_sequence(&self, tenant_id: TenantId, name: &str) -> Result<u64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO sequences (tenant_id, name, value)
            VALUES ($1, $2, 1)
            ON CONFLICT (tenant_id, name) DO UPDATE SET value = sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(name)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("next_sequence", e))?;

        let value: i64 = row
            .try_get("value")
            .map_err(|e| StoreError::Backend(format!("failed to read sequence value: {e}")))?;
        Ok(value as u64)
    }
}

fn document_from_row(key: DocumentKey, row: &PgRow) -> Result<StoredDocument, StoreError> {
    let read = |e: sqlx::Error| StoreError::Backend(format!("failed to decode document row: {e}"));

    let version: i64 = row.try_get("version").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(read)?;

    Ok(StoredDocument {
        key,
        unique_key: row.try_get("unique_key").map_err(read)?,
        version: version as u64,
        body: row.try_get("body").map_err(read)?,
        created_at,
        updated_at,
    })
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}
