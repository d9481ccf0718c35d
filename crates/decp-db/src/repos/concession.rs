//! Concession repository.

use decp_core::entities::{Concession, ConcessionAmendment, ExecutionData, Tariff};
use decp_core::enums::{
    ConcessionNature, ConcessionProcedure, EnvironmentalConsideration, SocialConsideration,
};

use crate::DecpDb;
use crate::error::DatabaseError;
use crate::helpers::{get_date, int_value, real_value};
use crate::repos::{insert_codes, insert_members, load_codes, load_members};

const COLUMNS: &str = "uid, id, authority_uid, nature, object, procedure, duration_months, \
     initial_duration_months, signed_on, published_on, execution_starts_on, global_value, \
     initial_global_value, public_subsidy";

fn row_to_concession(row: &libsql::Row) -> Result<Concession, DatabaseError> {
    Ok(Concession {
        uid: row.get::<i64>(0)?,
        id: row.get::<String>(1)?,
        authority_uid: row.get::<i64>(2)?,
        nature: ConcessionNature::from_code(row.get::<i64>(3)?)?,
        object: row.get::<String>(4)?,
        procedure: ConcessionProcedure::from_code(row.get::<i64>(5)?)?,
        duration_months: row.get::<i64>(6)?,
        initial_duration_months: row.get::<i64>(7)?,
        signed_on: get_date(row, 8)?,
        published_on: get_date(row, 9)?,
        execution_starts_on: get_date(row, 10)?,
        global_value: row.get::<f64>(11)?,
        initial_global_value: row.get::<f64>(12)?,
        public_subsidy: row.get::<f64>(13)?,
        social_considerations: Vec::new(),
        environmental_considerations: Vec::new(),
        concessionaire_uids: Vec::new(),
        amendments: Vec::new(),
        execution_data: Vec::new(),
    })
}

/// Write one concession and all of its children.
pub(crate) async fn insert_concession(
    conn: &libsql::Connection,
    c: &Concession,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO concessions ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        libsql::params_from_iter(vec![
            libsql::Value::Integer(c.uid),
            c.id.as_str().into(),
            libsql::Value::Integer(c.authority_uid),
            int_value(c.nature.code()),
            c.object.as_str().into(),
            int_value(c.procedure.code()),
            libsql::Value::Integer(c.duration_months),
            libsql::Value::Integer(c.initial_duration_months),
            libsql::Value::Text(c.signed_on.to_string()),
            libsql::Value::Text(c.published_on.to_string()),
            libsql::Value::Text(c.execution_starts_on.to_string()),
            libsql::Value::Real(c.global_value),
            libsql::Value::Real(c.initial_global_value),
            libsql::Value::Real(c.public_subsidy),
        ]),
    )
    .await?;

    let (codes, owner) = ("concession_codes", "concession_uid");
    insert_codes(
        conn,
        codes,
        owner,
        c.uid,
        SocialConsideration::TABLE,
        c.social_considerations.iter().map(|v| v.code()),
    )
    .await?;
    insert_codes(
        conn,
        codes,
        owner,
        c.uid,
        EnvironmentalConsideration::TABLE,
        c.environmental_considerations.iter().map(|v| v.code()),
    )
    .await?;
    insert_members(conn, "concession_concessionaires", owner, c.uid, &c.concessionaire_uids)
        .await?;

    for amendment in &c.amendments {
        conn.execute(
            "INSERT INTO concession_amendments (concession_uid, id, signed_on, published_on, duration_months, global_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params_from_iter(vec![
                libsql::Value::Integer(c.uid),
                libsql::Value::Integer(amendment.id),
                libsql::Value::Text(amendment.signed_on.to_string()),
                libsql::Value::Text(amendment.published_on.to_string()),
                int_value(amendment.duration_months),
                real_value(amendment.global_value),
            ]),
        )
        .await?;
    }

    for data in &c.execution_data {
        conn.execute(
            "INSERT INTO execution_data (concession_uid, published_on, investment_spending)
             VALUES (?1, ?2, ?3)",
            libsql::params![c.uid, data.published_on.to_string(), data.investment_spending],
        )
        .await?;
        let data_uid = conn.last_insert_rowid();
        for tariff in &data.tariffs {
            conn.execute(
                "INSERT INTO tariffs (execution_data_uid, label, amount) VALUES (?1, ?2, ?3)",
                libsql::params![data_uid, tariff.label.as_str(), tariff.amount],
            )
            .await?;
        }
    }
    Ok(())
}

impl DecpDb {
    pub async fn get_concession(&self, uid: i64) -> Result<Concession, DatabaseError> {
        let mut rows = self
            .query(&format!("SELECT {COLUMNS} FROM concessions WHERE uid = ?1"), [uid])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let mut concession = row_to_concession(&row)?;
        self.load_concession_children(&mut concession).await?;
        Ok(concession)
    }

    /// Every concession in import order, with children.
    pub async fn list_concessions(&self) -> Result<Vec<Concession>, DatabaseError> {
        let mut rows = self
            .query(&format!("SELECT {COLUMNS} FROM concessions ORDER BY uid"), ())
            .await?;
        let mut concessions = Vec::new();
        while let Some(row) = rows.next().await? {
            concessions.push(row_to_concession(&row)?);
        }
        for concession in &mut concessions {
            self.load_concession_children(concession).await?;
        }
        Ok(concessions)
    }

    pub async fn count_concessions(&self) -> Result<i64, DatabaseError> {
        self.query_i64("SELECT COUNT(*) FROM concessions", ()).await
    }

    async fn load_concession_children(&self, c: &mut Concession) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let (codes, owner) = ("concession_codes", "concession_uid");
        c.social_considerations = load_codes(conn, codes, owner, c.uid, SocialConsideration::TABLE)
            .await?
            .into_iter()
            .map(SocialConsideration::from_code)
            .collect::<Result<_, _>>()?;
        c.environmental_considerations =
            load_codes(conn, codes, owner, c.uid, EnvironmentalConsideration::TABLE)
                .await?
                .into_iter()
                .map(EnvironmentalConsideration::from_code)
                .collect::<Result<_, _>>()?;
        c.concessionaire_uids =
            load_members(conn, "concession_concessionaires", owner, c.uid).await?;

        let mut rows = self
            .query(
                "SELECT id, signed_on, published_on, duration_months, global_value
                 FROM concession_amendments WHERE concession_uid = ?1 ORDER BY uid",
                [c.uid],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            c.amendments.push(ConcessionAmendment {
                id: row.get::<i64>(0)?,
                signed_on: get_date(&row, 1)?,
                published_on: get_date(&row, 2)?,
                duration_months: row.get::<Option<i64>>(3)?,
                global_value: row.get::<Option<f64>>(4)?,
            });
        }

        let mut rows = self
            .query(
                "SELECT uid, published_on, investment_spending
                 FROM execution_data WHERE concession_uid = ?1 ORDER BY uid",
                [c.uid],
            )
            .await?;
        let mut data = Vec::new();
        while let Some(row) = rows.next().await? {
            data.push((
                row.get::<i64>(0)?,
                ExecutionData {
                    published_on: get_date(&row, 1)?,
                    investment_spending: row.get::<f64>(2)?,
                    tariffs: Vec::new(),
                },
            ));
        }
        for (data_uid, mut entry) in data {
            let mut rows = self
                .query(
                    "SELECT label, amount FROM tariffs WHERE execution_data_uid = ?1 ORDER BY uid",
                    [data_uid],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                entry.tariffs.push(Tariff {
                    label: row.get::<String>(0)?,
                    amount: row.get::<f64>(1)?,
                });
            }
            c.execution_data.push(entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use decp_core::entities::Organization;
    use decp_core::enums::IdentifierKind;
    use pretty_assertions::assert_eq;

    use crate::repos::organization::insert_organization;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn full_graph_round_trips() {
        let db = DecpDb::open_local(":memory:").await.unwrap();
        for (uid, siret) in [(1, "20005478100022"), (2, "57202552600029")] {
            insert_organization(
                db.conn(),
                &Organization::new(uid, siret.to_string(), IdentifierKind::Siret),
            )
            .await
            .unwrap();
        }
        let concession = Concession {
            uid: 1,
            id: "DSP-EAU-2021".to_string(),
            authority_uid: 1,
            nature: ConcessionNature::PublicServiceDelegation,
            object: "Exploitation du service de l'eau potable".to_string(),
            procedure: ConcessionProcedure::NegotiatedOpen,
            duration_months: 144,
            initial_duration_months: 144,
            signed_on: date(2021, 6, 30),
            published_on: date(2021, 7, 15),
            execution_starts_on: date(2022, 1, 1),
            global_value: 19_000_000.0,
            initial_global_value: 18_500_000.0,
            public_subsidy: 0.0,
            social_considerations: vec![],
            environmental_considerations: vec![EnvironmentalConsideration::Clause],
            concessionaire_uids: vec![2],
            amendments: vec![ConcessionAmendment {
                id: 0,
                signed_on: date(2023, 1, 10),
                published_on: date(2023, 1, 20),
                duration_months: None,
                global_value: Some(19_000_000.0),
            }],
            execution_data: vec![ExecutionData {
                published_on: date(2023, 4, 1),
                investment_spending: 450_000.0,
                tariffs: vec![
                    Tariff {
                        label: "Part fixe".to_string(),
                        amount: 42.3,
                    },
                    Tariff {
                        label: "Part variable".to_string(),
                        amount: 1.12,
                    },
                ],
            }],
        };
        insert_concession(db.conn(), &concession).await.unwrap();
        assert_eq!(db.get_concession(1).await.unwrap(), concession);
        assert_eq!(db.list_concessions().await.unwrap().len(), 1);
    }
}
