//! Rejected-item repository.

use decp_core::entities::{MalformedRecord, RecordError};
use decp_core::enums::RecordKind;

use crate::DecpDb;
use crate::error::DatabaseError;
use crate::helpers::{date_value, get_opt_date, int_value};

pub(crate) async fn insert_malformed(
    conn: &libsql::Connection,
    record: &MalformedRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO malformed_records (uid, kind, payload, organization_uid, created_on)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        libsql::params_from_iter(vec![
            libsql::Value::Integer(record.uid),
            record.kind.as_str().into(),
            record.payload.as_str().into(),
            int_value(record.organization_uid),
            date_value(record.created_on),
        ]),
    )
    .await?;
    for error in &record.errors {
        conn.execute(
            "INSERT INTO record_errors (malformed_uid, kind, location, message) VALUES (?1, ?2, ?3, ?4)",
            libsql::params![
                record.uid,
                error.kind.as_str(),
                error.location.as_str(),
                error.message.as_str()
            ],
        )
        .await?;
    }
    Ok(())
}

fn row_to_malformed(row: &libsql::Row) -> Result<MalformedRecord, DatabaseError> {
    Ok(MalformedRecord {
        uid: row.get::<i64>(0)?,
        kind: RecordKind::from_label(&row.get::<String>(1)?)?,
        payload: row.get::<String>(2)?,
        organization_uid: row.get::<Option<i64>>(3)?,
        created_on: get_opt_date(row, 4)?,
        errors: Vec::new(),
    })
}

impl DecpDb {
    /// Rejected items in import order, optionally restricted to one kind.
    pub async fn list_malformed(
        &self,
        kind: Option<RecordKind>,
    ) -> Result<Vec<MalformedRecord>, DatabaseError> {
        let mut rows = match kind {
            Some(kind) => {
                self.query(
                    "SELECT uid, kind, payload, organization_uid, created_on
                     FROM malformed_records WHERE kind = ?1 ORDER BY uid",
                    [kind.as_str()],
                )
                .await?
            }
            None => {
                self.query(
                    "SELECT uid, kind, payload, organization_uid, created_on
                     FROM malformed_records ORDER BY uid",
                    (),
                )
                .await?
            }
        };
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_malformed(&row)?);
        }
        for record in &mut records {
            let mut rows = self
                .query(
                    "SELECT kind, location, message FROM record_errors
                     WHERE malformed_uid = ?1 ORDER BY uid",
                    [record.uid],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                record.errors.push(RecordError {
                    kind: row.get::<String>(0)?,
                    location: row.get::<String>(1)?,
                    message: row.get::<String>(2)?,
                });
            }
        }
        Ok(records)
    }

    pub async fn count_malformed(&self) -> Result<i64, DatabaseError> {
        self.query_i64("SELECT COUNT(*) FROM malformed_records", ()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn insert_and_list_preserves_error_order() {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        let record = MalformedRecord {
            uid: 1,
            kind: RecordKind::Concession,
            payload: r#"{"id": "X", "valeurGlobale": 1.10}"#.to_string(),
            organization_uid: None,
            created_on: NaiveDate::from_ymd_opt(2022, 1, 3),
            errors: vec![
                RecordError {
                    kind: "missing".to_string(),
                    location: "objet".to_string(),
                    message: "\"objet\" is a required property".to_string(),
                },
                RecordError {
                    kind: "type_error".to_string(),
                    location: "dureeMois".to_string(),
                    message: "\"12\" is not of type \"integer\"".to_string(),
                },
            ],
        };
        insert_malformed(db.conn(), &record).await.unwrap();

        assert_eq!(db.list_malformed(None).await.unwrap(), vec![record.clone()]);
        assert_eq!(
            db.list_malformed(Some(RecordKind::Concession)).await.unwrap(),
            vec![record]
        );
        assert!(db.list_malformed(Some(RecordKind::Marche)).await.unwrap().is_empty());
        assert_eq!(db.count_malformed().await.unwrap(), 1);
    }
}
