//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.

use crate::DecpDb;
use crate::error::DatabaseError;

/// Initial schema: reference data, contracts, concessions, rejected items.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

/// Registry key figures per organization and year.
const MIGRATION_002: &str = include_str!("../migrations/002_financials.sql");

impl DecpDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        self.conn
            .execute_batch(MIGRATION_002)
            .await
            .map_err(|e| DatabaseError::Migration(format!("002_financials: {e}")))?;
        Ok(())
    }
}
