//! # Postgres Record Store
//!
//! `RecordStore` implementation over a `ceremony_contributions` table.
//! Queries use the sqlx runtime API; uniqueness and ordering constraints
//! are enforced at the application layer, matching the reconcile-based
//! consistency model (the blob store, not this table, is authoritative).
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE ceremony_contributions (
//!     id                 UUID PRIMARY KEY,
//!     circuit_id         TEXT NOT NULL,
//!     contribution_index BIGINT NOT NULL,
//!     contributor_name   TEXT NOT NULL,
//!     contribution_hash  TEXT NOT NULL,
//!     verified           BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use zkr_core::CircuitId;

use crate::error::RecordStoreError;
use crate::traits::RecordStore;
use crate::types::ContributionRow;

/// Postgres-backed record store.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DbRow {
    id: Uuid,
    circuit_id: String,
    contribution_index: i64,
    contributor_name: String,
    contribution_hash: String,
    verified: bool,
    created_at: DateTime<Utc>,
}

impl DbRow {
    /// Convert a database row into the typed gateway shape.
    ///
    /// Rows with an unknown circuit id or an out-of-range index are store
    /// corruption; they are skipped with a warning rather than failing the
    /// whole listing, since the reconcile path exists to repair exactly
    /// this kind of divergence.
    fn into_row(self) -> Option<ContributionRow> {
        let circuit: CircuitId = match self.circuit_id.parse() {
            Ok(c) => c,
            Err(_) => {
                tracing::warn!(
                    circuit_id = %self.circuit_id,
                    row_id = %self.id,
                    "skipping contribution row with unknown circuit id"
                );
                return None;
            }
        };
        let index: u32 = match self.contribution_index.try_into() {
            Ok(i) => i,
            Err(_) => {
                tracing::warn!(
                    index = self.contribution_index,
                    row_id = %self.id,
                    "skipping contribution row with out-of-range index"
                );
                return None;
            }
        };
        Some(ContributionRow {
            id: self.id,
            circuit,
            index,
            contributor_name: self.contributor_name,
            contribution_hash: self.contribution_hash,
            verified: self.verified,
            created_at: self.created_at,
        })
    }
}

/// Map a sqlx error to the gateway failure classes.
fn classify(err: sqlx::Error, operation: &str) -> RecordStoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_check_violation() => {
            RecordStoreError::Rejected(format!("{operation}: {db}"))
        }
        _ => RecordStoreError::Unavailable(format!("{operation}: {err}")),
    }
}

async fn insert_row(
    executor: impl sqlx::PgExecutor<'_>,
    row: &ContributionRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO ceremony_contributions \
         (id, circuit_id, contribution_index, contributor_name, contribution_hash, verified, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(row.id)
    .bind(row.circuit.as_str())
    .bind(i64::from(row.index))
    .bind(&row.contributor_name)
    .bind(&row.contribution_hash)
    .bind(row.verified)
    .bind(row.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, row: ContributionRow) -> Result<(), RecordStoreError> {
        insert_row(&self.pool, &row)
            .await
            .map_err(|e| classify(e, "insert"))
    }

    async fn list(&self) -> Result<Vec<ContributionRow>, RecordStoreError> {
        let rows: Vec<DbRow> = sqlx::query_as(
            "SELECT id, circuit_id, contribution_index, contributor_name, \
                    contribution_hash, verified, created_at \
             FROM ceremony_contributions \
             ORDER BY circuit_id, contribution_index",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, "list"))?;

        Ok(rows.into_iter().filter_map(DbRow::into_row).collect())
    }

    async fn delete_all(&self) -> Result<u64, RecordStoreError> {
        let result = sqlx::query("DELETE FROM ceremony_contributions")
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "delete_all"))?;
        Ok(result.rows_affected())
    }

    async fn replace_all(&self, rows: Vec<ContributionRow>) -> Result<u64, RecordStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify(e, "replace_all"))?;

        sqlx::query("DELETE FROM ceremony_contributions")
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, "replace_all"))?;

        for row in &rows {
            insert_row(&mut *tx, row)
                .await
                .map_err(|e| classify(e, "replace_all"))?;
        }

        tx.commit().await.map_err(|e| classify(e, "replace_all"))?;
        Ok(rows.len() as u64)
    }

    async fn count(&self) -> Result<u64, RecordStoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ceremony_contributions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "count"))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_row(circuit_id: &str, index: i64) -> DbRow {
        DbRow {
            id: Uuid::new_v4(),
            circuit_id: circuit_id.to_string(),
            contribution_index: index,
            contributor_name: "alice".into(),
            contribution_hash: "h1".into(),
            verified: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn db_row_converts_known_circuit() {
        let row = db_row("age-verification", 3).into_row().unwrap();
        assert_eq!(row.circuit, CircuitId::AgeVerification);
        assert_eq!(row.index, 3);
        assert!(row.verified);
    }

    #[test]
    fn db_row_with_unknown_circuit_is_skipped() {
        assert!(db_row("definitely-not-a-circuit", 1).into_row().is_none());
    }

    #[test]
    fn db_row_with_negative_index_is_skipped() {
        assert!(db_row("age-verification", -4).into_row().is_none());
    }
}
