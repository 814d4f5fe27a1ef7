//! services/api/src/adapters/store.rs
//!
//! This module contains the document-store adapter, which is the concrete
//! implementation of the `DocumentStore` port from the `core` crate. It maps
//! the collection/document contract onto a single JSONB table in PostgreSQL
//! using `sqlx`.

use async_trait::async_trait;
use messenger_core::ports::{CoreError, CoreResult, DocumentStore, QueryOperator};
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A PostgreSQL adapter that implements the `DocumentStore` port.
///
/// One adapter wraps one long-lived connection pool, built once at startup
/// and shared by every concurrent logical operation.
#[derive(Clone)]
pub struct PgDocStore {
    pool: PgPool,
}

impl PgDocStore {
    /// Creates a new `PgDocStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Field names are interpolated into SQL (bind parameters cannot name a
/// JSONB key), so they are restricted to plain identifiers.
fn ensure_identifier(field: &str) -> CoreResult<()> {
    let ok = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CoreError::Storage(format!("invalid field name '{field}'")))
    }
}

fn storage_error(e: sqlx::Error) -> CoreError {
    CoreError::Storage(e.to_string())
}

#[async_trait]
impl DocumentStore for PgDocStore {
    async fn put(&self, collection: &str, id: Option<&str>, record: Value) -> CoreResult<String> {
        let doc_id = match id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        sqlx::query(
            "INSERT INTO documents (collection, doc_id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, doc_id) DO UPDATE SET data = EXCLUDED.data",
        )
        .bind(collection)
        .bind(&doc_id)
        .bind(&record)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(doc_id)
    }

    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND doc_id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(|r| r.try_get::<Value, _>("data").map_err(storage_error))
            .transpose()
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        operator: QueryOperator,
        value: Value,
    ) -> CoreResult<Vec<Value>> {
        ensure_identifier(field)?;
        let sql = match operator {
            QueryOperator::Eq => format!(
                "SELECT data FROM documents WHERE collection = $1 AND data->'{field}' = $2 ORDER BY doc_id"
            ),
            QueryOperator::ArrayContains => format!(
                "SELECT data FROM documents WHERE collection = $1 AND data->'{field}' @> $2 ORDER BY doc_id"
            ),
        };

        let rows = sqlx::query(&sql)
            .bind(collection)
            .bind(&value)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("data").map_err(storage_error))
            .collect()
    }

    async fn list(&self, collection: &str) -> CoreResult<Vec<Value>> {
        let rows = sqlx::query("SELECT data FROM documents WHERE collection = $1 ORDER BY doc_id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("data").map_err(storage_error))
            .collect()
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> CoreResult<()> {
        ensure_identifier(field)?;

        let result = sqlx::query(
            "UPDATE documents SET data = jsonb_set(data, ARRAY[$3]::text[], $4, true)
             WHERE collection = $1 AND doc_id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(&value)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("{collection}/{id}")));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> CoreResult<()> {
        // Deleting an absent document is not an error.
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND doc_id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ensure_identifier;

    #[test]
    fn identifier_guard_accepts_plain_names() {
        assert!(ensure_identifier("participants").is_ok());
        assert!(ensure_identifier("updated_at").is_ok());
    }

    #[test]
    fn identifier_guard_rejects_sql_fragments() {
        assert!(ensure_identifier("").is_err());
        assert!(ensure_identifier("a' = '1' OR '1").is_err());
        assert!(ensure_identifier("data->>'x'").is_err());
    }
}
