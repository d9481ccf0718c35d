//! Store maintenance: resets, counts and uid high-water marks.

use decp_core::responses::ResetResponse;
use tracing::info;

use crate::DecpDb;
use crate::error::DatabaseError;

/// Tables rebuilt by every full import, children before parents.
pub const IMPORTED_TABLES: &[&str] = &[
    "record_errors",
    "malformed_records",
    "tariffs",
    "execution_data",
    "concession_amendments",
    "concession_concessionaires",
    "concession_codes",
    "concessions",
    "subcontracting_amendments",
    "subcontracting_acts",
    "contract_amendment_sellers",
    "contract_amendments",
    "contract_sellers",
    "contract_codes",
    "contracts",
];

/// Reference data kept by a partial reset.
pub const REFERENCE_TABLES: &[&str] = &["organization_financials", "organizations", "places", "cpv"];

/// Every table of the schema.
pub const ALL_TABLES: &[&str] = &[
    "record_errors",
    "malformed_records",
    "tariffs",
    "execution_data",
    "concession_amendments",
    "concession_concessionaires",
    "concession_codes",
    "concessions",
    "subcontracting_amendments",
    "subcontracting_acts",
    "contract_amendment_sellers",
    "contract_amendments",
    "contract_sellers",
    "contract_codes",
    "contracts",
    "organization_financials",
    "organizations",
    "places",
    "cpv",
];

fn known_table(table: &str) -> Result<&'static str, DatabaseError> {
    ALL_TABLES
        .iter()
        .copied()
        .find(|t| *t == table)
        .ok_or_else(|| DatabaseError::InvalidState(format!("unknown table '{table}'")))
}

impl DecpDb {
    /// Clear imported records, and reference data too unless `keep_reference`.
    ///
    /// Runs in one transaction.
    pub async fn reset(&self, keep_reference: bool) -> Result<ResetResponse, DatabaseError> {
        let mut tables: Vec<&str> = IMPORTED_TABLES.to_vec();
        if !keep_reference {
            tables.extend_from_slice(REFERENCE_TABLES);
        }

        let tx = self.conn().transaction().await?;
        for table in &tables {
            tx.execute(&format!("DELETE FROM {table}"), ()).await?;
        }
        tx.commit().await?;

        if keep_reference {
            info!("partial reset: organizations and places kept");
        } else {
            info!("full reset");
        }
        Ok(ResetResponse {
            tables_cleared: tables.iter().map(ToString::to_string).collect(),
            kept_reference_data: keep_reference,
        })
    }

    /// Highest `uid` of a table, 0 when empty.
    pub async fn max_uid(&self, table: &str) -> Result<i64, DatabaseError> {
        let table = known_table(table)?;
        self.query_i64(&format!("SELECT COALESCE(MAX(uid), 0) FROM {table}"), ())
            .await
    }

    /// Row count of every table, in schema order.
    pub async fn table_counts(&self) -> Result<Vec<(&'static str, i64)>, DatabaseError> {
        let mut counts = Vec::with_capacity(ALL_TABLES.len());
        for table in ALL_TABLES {
            let n = self
                .query_i64(&format!("SELECT COUNT(*) FROM {table}"), ())
                .await?;
            counts.push((*table, n));
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn seeded_db() -> DecpDb {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        db.execute(
            "INSERT INTO organizations (uid, identifier, identifier_kind) VALUES (5, '21750001600019', 'SIRET')",
            (),
        )
        .await
        .unwrap();
        db.execute("INSERT INTO places (uid, code, kind) VALUES (1, '75056', 2)", ())
            .await
            .unwrap();
        db.execute(
            "INSERT INTO malformed_records (uid, kind, payload, organization_uid) VALUES (3, 'marche', '{}', 5)",
            (),
        )
        .await
        .unwrap();
        db.execute(
            "INSERT INTO record_errors (malformed_uid, kind, location, message) VALUES (3, 'missing', 'id', 'required')",
            (),
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn partial_reset_keeps_reference_data() {
        let db = seeded_db().await;
        let response = db.reset(true).await.unwrap();
        assert!(response.kept_reference_data);
        assert!(!response.tables_cleared.contains(&"organizations".to_string()));
        assert_eq!(db.count_malformed().await.unwrap(), 0);
        assert_eq!(db.count_organizations().await.unwrap(), 1);
        assert_eq!(db.count_places().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn full_reset_clears_everything() {
        let db = seeded_db().await;
        let response = db.reset(false).await.unwrap();
        assert_eq!(response.tables_cleared.len(), ALL_TABLES.len());
        for (table, n) in db.table_counts().await.unwrap() {
            assert_eq!(n, 0, "{table} should be empty");
        }
    }

    #[tokio::test]
    async fn max_uid_of_empty_and_filled_tables() {
        let db = seeded_db().await;
        assert_eq!(db.max_uid("contracts").await.unwrap(), 0);
        assert_eq!(db.max_uid("organizations").await.unwrap(), 5);
        assert_eq!(db.max_uid("malformed_records").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn max_uid_rejects_unknown_table() {
        let db = seeded_db().await;
        assert!(matches!(
            db.max_uid("sqlite_master").await,
            Err(DatabaseError::InvalidState(_))
        ));
    }
}
