//! Staged work of one batch and its transactional write.

use decp_core::entities::{Concession, Contract, MalformedRecord, Organization, Place};

use crate::DecpDb;
use crate::error::DatabaseError;
use crate::repos::concession::insert_concession;
use crate::repos::contract::insert_contract;
use crate::repos::malformed::insert_malformed;
use crate::repos::organization::{insert_organization, update_organization_roles};
use crate::repos::place::insert_place;

/// Everything staged since the last commit.
#[derive(Debug, Default)]
pub struct PendingBatch {
    pub new_organizations: Vec<Organization>,
    pub updated_organizations: Vec<Organization>,
    pub new_places: Vec<Place>,
    pub contracts: Vec<Contract>,
    pub concessions: Vec<Concession>,
    pub malformed: Vec<MalformedRecord>,
}

impl PendingBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_organizations.is_empty()
            && self.updated_organizations.is_empty()
            && self.new_places.is_empty()
            && self.contracts.is_empty()
            && self.concessions.is_empty()
            && self.malformed.is_empty()
    }

    /// Number of input items the batch accounts for.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.contracts.len() + self.concessions.len() + self.malformed.len()
    }
}

impl DecpDb {
    /// Write a batch in a single transaction.
    ///
    /// Reference rows go first so every foreign key of the records resolves.
    /// On error the transaction is rolled back and nothing of the batch is
    /// kept.
    pub async fn write_batch(&self, batch: &PendingBatch) -> Result<(), DatabaseError> {
        let tx = self.conn().transaction().await?;
        match write_rows(&tx, batch).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        }
        Ok(())
    }
}

async fn write_rows(conn: &libsql::Connection, batch: &PendingBatch) -> Result<(), DatabaseError> {
    for org in &batch.new_organizations {
        insert_organization(conn, org).await?;
    }
    for org in &batch.updated_organizations {
        update_organization_roles(conn, org).await?;
    }
    for place in &batch.new_places {
        insert_place(conn, place).await?;
    }
    for contract in &batch.contracts {
        insert_contract(conn, contract).await?;
    }
    for concession in &batch.concessions {
        insert_concession(conn, concession).await?;
    }
    for record in &batch.malformed {
        insert_malformed(conn, record).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use decp_core::enums::{IdentifierKind, PlaceKind, RecordKind};
    use pretty_assertions::assert_eq;

    fn malformed(uid: i64, organization_uid: Option<i64>) -> MalformedRecord {
        MalformedRecord {
            uid,
            kind: RecordKind::Marche,
            payload: "{}".to_string(),
            organization_uid,
            created_on: None,
            errors: vec![],
        }
    }

    #[tokio::test]
    async fn writes_reference_rows_before_records() {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        let batch = PendingBatch {
            new_organizations: vec![Organization::new(
                1,
                "21750001600019".to_string(),
                IdentifierKind::Siret,
            )],
            new_places: vec![Place {
                uid: 1,
                code: "75".to_string(),
                kind: PlaceKind::Department,
            }],
            malformed: vec![malformed(1, Some(1))],
            ..PendingBatch::default()
        };
        assert_eq!(batch.item_count(), 1);
        db.write_batch(&batch).await.unwrap();
        assert_eq!(db.count_organizations().await.unwrap(), 1);
        assert_eq!(db.count_places().await.unwrap(), 1);
        assert_eq!(db.count_malformed().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_batch_leaves_nothing_behind() {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        let batch = PendingBatch {
            new_organizations: vec![Organization::new(
                1,
                "21750001600019".to_string(),
                IdentifierKind::Siret,
            )],
            // Dangling organization reference.
            malformed: vec![malformed(1, Some(99))],
            ..PendingBatch::default()
        };
        assert!(db.write_batch(&batch).await.is_err());
        assert_eq!(db.count_organizations().await.unwrap(), 0);
        assert_eq!(db.count_malformed().await.unwrap(), 0);
    }

    #[test]
    fn empty_batch() {
        assert!(PendingBatch::default().is_empty());
    }
}
