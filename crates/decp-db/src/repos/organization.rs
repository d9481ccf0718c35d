//! Organization repository: preload, lookups, role flags, enrichment details.

use decp_core::entities::Organization;
use decp_core::enums::IdentifierKind;

use crate::DecpDb;
use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, real_value};

const COLUMNS: &str =
    "uid, identifier, identifier_kind, is_buyer, is_seller, name, size_category, longitude, latitude";

fn row_to_organization(row: &libsql::Row) -> Result<Organization, DatabaseError> {
    Ok(Organization {
        uid: row.get::<i64>(0)?,
        identifier: row.get::<String>(1)?,
        identifier_kind: IdentifierKind::from_label(&row.get::<String>(2)?)?,
        is_buyer: get_bool(row, 3)?,
        is_seller: get_bool(row, 4)?,
        name: get_opt_string(row, 5)?,
        size_category: get_opt_string(row, 6)?,
        longitude: row.get::<Option<f64>>(7)?,
        latitude: row.get::<Option<f64>>(8)?,
    })
}

/// Details returned by the company registry for one organization.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationDetails {
    pub uid: i64,
    pub name: Option<String>,
    pub size_category: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

pub(crate) async fn insert_organization(
    conn: &libsql::Connection,
    org: &Organization,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO organizations ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        libsql::params_from_iter(vec![
            libsql::Value::Integer(org.uid),
            org.identifier.as_str().into(),
            org.identifier_kind.as_str().into(),
            libsql::Value::Integer(i64::from(org.is_buyer)),
            libsql::Value::Integer(i64::from(org.is_seller)),
            org.name.as_deref().into(),
            org.size_category.as_deref().into(),
            real_value(org.longitude),
            real_value(org.latitude),
        ]),
    )
    .await?;
    Ok(())
}

/// Persist raised role flags. Flags never go back to false.
pub(crate) async fn update_organization_roles(
    conn: &libsql::Connection,
    org: &Organization,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE organizations SET is_buyer = MAX(is_buyer, ?2), is_seller = MAX(is_seller, ?3)
         WHERE uid = ?1",
        libsql::params![org.uid, i64::from(org.is_buyer), i64::from(org.is_seller)],
    )
    .await?;
    Ok(())
}

impl DecpDb {
    /// Every organization, for the resolver preload.
    pub async fn load_organizations(&self) -> Result<Vec<Organization>, DatabaseError> {
        let mut rows = self
            .query(&format!("SELECT {COLUMNS} FROM organizations ORDER BY uid"), ())
            .await?;
        let mut orgs = Vec::new();
        while let Some(row) = rows.next().await? {
            orgs.push(row_to_organization(&row)?);
        }
        Ok(orgs)
    }

    pub async fn get_organization(&self, uid: i64) -> Result<Organization, DatabaseError> {
        let mut rows = self
            .query(&format!("SELECT {COLUMNS} FROM organizations WHERE uid = ?1"), [uid])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_organization(&row)
    }

    pub async fn find_organization(
        &self,
        identifier: &str,
        kind: IdentifierKind,
    ) -> Result<Option<Organization>, DatabaseError> {
        let mut rows = self
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM organizations WHERE identifier = ?1 AND identifier_kind = ?2"
                ),
                libsql::params![identifier, kind.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_organization(&row)?)),
            None => Ok(None),
        }
    }

    /// SIRET organizations still missing a display name, newest first.
    pub async fn list_unnamed_siret_organizations(
        &self,
    ) -> Result<Vec<Organization>, DatabaseError> {
        let mut rows = self
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM organizations
                     WHERE identifier_kind = ?1 AND (name IS NULL OR name = '')
                     ORDER BY uid DESC"
                ),
                [IdentifierKind::Siret.as_str()],
            )
            .await?;
        let mut orgs = Vec::new();
        while let Some(row) = rows.next().await? {
            orgs.push(row_to_organization(&row)?);
        }
        Ok(orgs)
    }

    /// Write enrichment details for several organizations in one transaction.
    ///
    /// Returns the number of rows updated.
    pub async fn update_organization_details(
        &self,
        updates: &[OrganizationDetails],
    ) -> Result<u64, DatabaseError> {
        if updates.is_empty() {
            return Ok(0);
        }
        let tx = self.conn().transaction().await?;
        let mut updated = 0;
        for details in updates {
            updated += tx
                .execute(
                    "UPDATE organizations SET name = ?2, size_category = ?3, longitude = ?4, latitude = ?5
                     WHERE uid = ?1",
                    libsql::params_from_iter(vec![
                        libsql::Value::Integer(details.uid),
                        details.name.as_deref().into(),
                        details.size_category.as_deref().into(),
                        real_value(details.longitude),
                        real_value(details.latitude),
                    ]),
                )
                .await?;
        }
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn count_organizations(&self) -> Result<i64, DatabaseError> {
        self.query_i64("SELECT COUNT(*) FROM organizations", ()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn test_db() -> DecpDb {
        DecpDb::open_local(":memory:").await.unwrap()
    }

    fn org(uid: i64, identifier: &str) -> Organization {
        Organization::new(uid, identifier.to_string(), IdentifierKind::Siret)
    }

    #[tokio::test]
    async fn insert_and_find() {
        let db = test_db().await;
        let mut buyer = org(1, "21750001600019");
        buyer.is_buyer = true;
        insert_organization(db.conn(), &buyer).await.unwrap();

        let found = db
            .find_organization("21750001600019", IdentifierKind::Siret)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, buyer);
        assert!(
            db.find_organization("21750001600019", IdentifierKind::Tva)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn role_flags_never_lowered() {
        let db = test_db().await;
        let mut o = org(1, "44306184100047");
        o.is_buyer = true;
        insert_organization(db.conn(), &o).await.unwrap();

        o.is_buyer = false;
        o.is_seller = true;
        update_organization_roles(db.conn(), &o).await.unwrap();

        let stored = db.get_organization(1).await.unwrap();
        assert!(stored.is_buyer);
        assert!(stored.is_seller);
    }

    #[tokio::test]
    async fn unnamed_sirets_newest_first() {
        let db = test_db().await;
        insert_organization(db.conn(), &org(1, "11111111111111")).await.unwrap();
        insert_organization(db.conn(), &org(2, "22222222222222")).await.unwrap();
        let mut named = org(3, "33333333333333");
        named.name = Some("ACME".to_string());
        insert_organization(db.conn(), &named).await.unwrap();
        insert_organization(
            db.conn(),
            &Organization::new(4, "FR123".to_string(), IdentifierKind::Tva),
        )
        .await
        .unwrap();

        let uids: Vec<i64> = db
            .list_unnamed_siret_organizations()
            .await
            .unwrap()
            .iter()
            .map(|o| o.uid)
            .collect();
        assert_eq!(uids, vec![2, 1]);
    }

    #[tokio::test]
    async fn details_update_in_one_transaction() {
        let db = test_db().await;
        insert_organization(db.conn(), &org(1, "11111111111111")).await.unwrap();
        let updated = db
            .update_organization_details(&[OrganizationDetails {
                uid: 1,
                name: Some("COMMUNE DE TEST".to_string()),
                size_category: Some("PME".to_string()),
                longitude: Some(2.35),
                latitude: Some(48.85),
            }])
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let stored = db.get_organization(1).await.unwrap();
        assert_eq!(stored.name.as_deref(), Some("COMMUNE DE TEST"));
        assert_eq!(stored.size_category.as_deref(), Some("PME"));
        assert_eq!(stored.latitude, Some(48.85));
    }

    #[tokio::test]
    async fn load_all_for_preload() {
        let db = test_db().await;
        insert_organization(db.conn(), &org(1, "11111111111111")).await.unwrap();
        insert_organization(db.conn(), &org(2, "22222222222222")).await.unwrap();
        assert_eq!(db.load_organizations().await.unwrap().len(), 2);
        assert_eq!(db.count_organizations().await.unwrap(), 2);
    }
}
