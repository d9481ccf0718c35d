//! # decp-db
//!
//! libSQL storage for the DECP relational model and the streaming import
//! pipeline that fills it.
//!
//! The store holds organizations, execution places, contract awards,
//! concessions, their ordered child collections, and the rejected items with
//! their validation errors. Organizations and places are reference data that
//! survive a partial reset; everything else is rebuilt by each full import.

pub mod error;
pub mod helpers;
pub mod import;
mod migrations;
pub mod repos;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for the DECP store.
///
/// Wraps a libSQL database and one connection. Repository methods live in
/// `repos` as `impl DecpDb` blocks.
pub struct DecpDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl DecpDb {
    /// Open a local database at the given path (`:memory:` for tests).
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let decp_db = Self { db, conn };
        decp_db.run_migrations().await?;
        Ok(decp_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Execute a write statement, returning the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the statement fails.
    pub async fn execute(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<u64, DatabaseError> {
        Ok(self.conn.execute(sql, params).await?)
    }

    /// Run a query and return its rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the query fails.
    pub async fn query(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<libsql::Rows, DatabaseError> {
        Ok(self.conn.query(sql, params).await?)
    }

    /// Read a single integer produced by `sql`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the query yields no row.
    pub async fn query_i64(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<i64, DatabaseError> {
        let mut rows = self.query(sql, params).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> DecpDb {
        DecpDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        for table in repos::maintenance::ALL_TABLES {
            let mut rows = db
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        // Second run is a no-op
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_enforced() {
        let db = test_db().await;
        let result = db
            .execute(
                "INSERT INTO malformed_records (uid, kind, payload, organization_uid) VALUES (1, 'marche', '{}', 42)",
                (),
            )
            .await;
        assert!(result.is_err(), "dangling organization_uid should be rejected");
    }

    #[tokio::test]
    async fn organization_key_is_unique() {
        let db = test_db().await;
        let insert = "INSERT INTO organizations (uid, identifier, identifier_kind) VALUES (?1, '21750001600019', 'SIRET')";
        db.execute(insert, [1_i64]).await.unwrap();
        assert!(db.execute(insert, [2_i64]).await.is_err());
    }

    #[tokio::test]
    async fn query_i64_reads_scalar() {
        let db = test_db().await;
        let n = db.query_i64("SELECT COUNT(*) FROM contracts", ()).await.unwrap();
        assert_eq!(n, 0);
    }
}
