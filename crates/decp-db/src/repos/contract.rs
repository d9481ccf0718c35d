//! Contract repository: batch writer and read-back of the full contract graph.

use decp_core::entities::{Contract, ContractAmendment, SubcontractingAct, SubcontractingAmendment};
use decp_core::enums::{
    Category, Ccag, ContractNature, ContractProcedure, EnvironmentalConsideration, ExecutionMode,
    OperatorGrouping, PriceForm, PriceType, PriceVariation, PurchaseTechnique, SocialConsideration,
};

use crate::DecpDb;
use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_date, get_opt_code, int_value, real_value};
use crate::repos::{insert_codes, insert_members, load_codes, load_members};

const COLUMNS: &str = "uid, id, buyer_uid, nature, object, cpv, category, framework_uid, innovative, \
     ccag, offers_received, advance_granted, advance_rate, operator_grouping, subcontracting_declared, \
     procedure, place_uid, duration_months, initial_duration_months, notified_on, published_on, \
     amount, initial_amount, price_form, eu_origin, france_origin";

fn required_code(code: Option<i64>, what: &str) -> Result<i64, DatabaseError> {
    code.ok_or_else(|| DatabaseError::InvalidState(format!("{what} has no persisted code")))
}

fn row_to_contract(row: &libsql::Row) -> Result<Contract, DatabaseError> {
    Ok(Contract {
        uid: row.get::<i64>(0)?,
        id: row.get::<String>(1)?,
        buyer_uid: row.get::<i64>(2)?,
        nature: ContractNature::from_code(row.get::<i64>(3)?)?,
        object: row.get::<String>(4)?,
        cpv: row.get::<String>(5)?,
        category: Category::from_code(row.get::<i64>(6)?)?,
        framework_uid: row.get::<Option<i64>>(7)?,
        innovative: get_bool(row, 8)?,
        ccag: get_opt_code(row, 9, Ccag::from_code)?,
        offers_received: row.get::<Option<i64>>(10)?,
        advance_granted: get_bool(row, 11)?,
        advance_rate: row.get::<Option<f64>>(12)?,
        operator_grouping: get_opt_code(row, 13, OperatorGrouping::from_code)?,
        subcontracting_declared: get_bool(row, 14)?,
        procedure: get_opt_code(row, 15, ContractProcedure::from_code)?,
        place_uid: row.get::<Option<i64>>(16)?,
        duration_months: row.get::<i64>(17)?,
        initial_duration_months: row.get::<i64>(18)?,
        notified_on: get_date(row, 19)?,
        published_on: get_date(row, 20)?,
        amount: row.get::<f64>(21)?,
        initial_amount: row.get::<f64>(22)?,
        price_form: get_opt_code(row, 23, PriceForm::from_code)?,
        eu_origin: row.get::<Option<f64>>(24)?,
        france_origin: row.get::<Option<f64>>(25)?,
        price_types: Vec::new(),
        execution_modes: Vec::new(),
        purchase_techniques: Vec::new(),
        social_considerations: Vec::new(),
        environmental_considerations: Vec::new(),
        seller_uids: Vec::new(),
        amendments: Vec::new(),
        subcontracting_acts: Vec::new(),
    })
}

/// Write one contract and all of its children.
pub(crate) async fn insert_contract(
    conn: &libsql::Connection,
    c: &Contract,
) -> Result<(), DatabaseError> {
    let params: Vec<libsql::Value> = vec![
        libsql::Value::Integer(c.uid),
        c.id.as_str().into(),
        libsql::Value::Integer(c.buyer_uid),
        libsql::Value::Integer(required_code(c.nature.code(), "contract nature")?),
        c.object.as_str().into(),
        c.cpv.as_str().into(),
        libsql::Value::Integer(required_code(c.category.code(), "category")?),
        int_value(c.framework_uid),
        libsql::Value::Integer(i64::from(c.innovative)),
        int_value(c.ccag.and_then(Ccag::code)),
        int_value(c.offers_received),
        libsql::Value::Integer(i64::from(c.advance_granted)),
        real_value(c.advance_rate),
        int_value(c.operator_grouping.and_then(OperatorGrouping::code)),
        libsql::Value::Integer(i64::from(c.subcontracting_declared)),
        int_value(c.procedure.and_then(ContractProcedure::code)),
        int_value(c.place_uid),
        libsql::Value::Integer(c.duration_months),
        libsql::Value::Integer(c.initial_duration_months),
        libsql::Value::Text(c.notified_on.to_string()),
        libsql::Value::Text(c.published_on.to_string()),
        libsql::Value::Real(c.amount),
        libsql::Value::Real(c.initial_amount),
        int_value(c.price_form.and_then(PriceForm::code)),
        real_value(c.eu_origin),
        real_value(c.france_origin),
    ];
    let placeholders = (1..=params.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!("INSERT INTO contracts ({COLUMNS}) VALUES ({placeholders})"),
        libsql::params_from_iter(params),
    )
    .await?;

    let codes = "contract_codes";
    let owner = "contract_uid";
    insert_codes(conn, codes, owner, c.uid, PriceType::TABLE, c.price_types.iter().map(|v| v.code())).await?;
    insert_codes(conn, codes, owner, c.uid, ExecutionMode::TABLE, c.execution_modes.iter().map(|v| v.code())).await?;
    insert_codes(conn, codes, owner, c.uid, PurchaseTechnique::TABLE, c.purchase_techniques.iter().map(|v| v.code())).await?;
    insert_codes(conn, codes, owner, c.uid, SocialConsideration::TABLE, c.social_considerations.iter().map(|v| v.code())).await?;
    insert_codes(
        conn,
        codes,
        owner,
        c.uid,
        EnvironmentalConsideration::TABLE,
        c.environmental_considerations.iter().map(|v| v.code()),
    )
    .await?;
    insert_members(conn, "contract_sellers", owner, c.uid, &c.seller_uids).await?;

    for amendment in &c.amendments {
        conn.execute(
            "INSERT INTO contract_amendments (contract_uid, id, duration_months, amount, notified_on, published_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params_from_iter(vec![
                libsql::Value::Integer(c.uid),
                libsql::Value::Integer(amendment.id),
                int_value(amendment.duration_months),
                real_value(amendment.amount),
                libsql::Value::Text(amendment.notified_on.to_string()),
                libsql::Value::Text(amendment.published_on.to_string()),
            ]),
        )
        .await?;
        let amendment_uid = conn.last_insert_rowid();
        insert_members(
            conn,
            "contract_amendment_sellers",
            "amendment_uid",
            amendment_uid,
            &amendment.seller_uids,
        )
        .await?;
    }

    for act in &c.subcontracting_acts {
        insert_subcontracting_act(conn, c.uid, act).await?;
    }
    Ok(())
}

async fn insert_subcontracting_act(
    conn: &libsql::Connection,
    contract_uid: i64,
    act: &SubcontractingAct,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO subcontracting_acts (contract_uid, id, subcontractor_uid, duration_months,
             initial_duration_months, notified_on, published_on, amount, initial_amount, price_variation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        libsql::params_from_iter(vec![
            libsql::Value::Integer(contract_uid),
            libsql::Value::Integer(act.id),
            libsql::Value::Integer(act.subcontractor_uid),
            libsql::Value::Integer(act.duration_months),
            libsql::Value::Integer(act.initial_duration_months),
            libsql::Value::Text(act.notified_on.to_string()),
            libsql::Value::Text(act.published_on.to_string()),
            libsql::Value::Real(act.amount),
            libsql::Value::Real(act.initial_amount),
            int_value(act.price_variation.and_then(PriceVariation::code)),
        ]),
    )
    .await?;
    let act_uid = conn.last_insert_rowid();

    for amendment in &act.amendments {
        conn.execute(
            "INSERT INTO subcontracting_amendments (act_uid, duration_months, amount, notified_on, published_on)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            libsql::params_from_iter(vec![
                libsql::Value::Integer(act_uid),
                int_value(amendment.duration_months),
                real_value(amendment.amount),
                libsql::Value::Text(amendment.notified_on.to_string()),
                libsql::Value::Text(amendment.published_on.to_string()),
            ]),
        )
        .await?;
    }
    Ok(())
}

fn decode_all<T>(
    codes: Vec<i64>,
    decode: fn(i64) -> Result<T, decp_core::errors::CoreError>,
) -> Result<Vec<T>, DatabaseError> {
    Ok(codes.into_iter().map(decode).collect::<Result<Vec<_>, _>>()?)
}

impl DecpDb {
    pub async fn get_contract(&self, uid: i64) -> Result<Contract, DatabaseError> {
        let mut rows = self
            .query(&format!("SELECT {COLUMNS} FROM contracts WHERE uid = ?1"), [uid])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let mut contract = row_to_contract(&row)?;
        self.load_contract_children(&mut contract).await?;
        Ok(contract)
    }

    /// Every contract carrying the given feed id, in import order.
    pub async fn find_contracts_by_id(&self, id: &str) -> Result<Vec<Contract>, DatabaseError> {
        self.load_contracts_where("WHERE id = ?1", [id]).await
    }

    /// Every contract in import order, with children.
    pub async fn list_contracts(&self) -> Result<Vec<Contract>, DatabaseError> {
        self.load_contracts_where("", ()).await
    }

    pub async fn count_contracts(&self) -> Result<i64, DatabaseError> {
        self.query_i64("SELECT COUNT(*) FROM contracts", ()).await
    }

    async fn load_contracts_where(
        &self,
        filter: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Contract>, DatabaseError> {
        let mut rows = self
            .query(&format!("SELECT {COLUMNS} FROM contracts {filter} ORDER BY uid"), params)
            .await?;
        let mut contracts = Vec::new();
        while let Some(row) = rows.next().await? {
            contracts.push(row_to_contract(&row)?);
        }
        for contract in &mut contracts {
            self.load_contract_children(contract).await?;
        }
        Ok(contracts)
    }

    async fn load_contract_children(&self, c: &mut Contract) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let (codes, owner) = ("contract_codes", "contract_uid");
        c.price_types = decode_all(
            load_codes(conn, codes, owner, c.uid, PriceType::TABLE).await?,
            PriceType::from_code,
        )?;
        c.execution_modes = decode_all(
            load_codes(conn, codes, owner, c.uid, ExecutionMode::TABLE).await?,
            ExecutionMode::from_code,
        )?;
        c.purchase_techniques = decode_all(
            load_codes(conn, codes, owner, c.uid, PurchaseTechnique::TABLE).await?,
            PurchaseTechnique::from_code,
        )?;
        c.social_considerations = decode_all(
            load_codes(conn, codes, owner, c.uid, SocialConsideration::TABLE).await?,
            SocialConsideration::from_code,
        )?;
        c.environmental_considerations = decode_all(
            load_codes(conn, codes, owner, c.uid, EnvironmentalConsideration::TABLE).await?,
            EnvironmentalConsideration::from_code,
        )?;
        c.seller_uids = load_members(conn, "contract_sellers", owner, c.uid).await?;

        let mut rows = self
            .query(
                "SELECT uid, id, duration_months, amount, notified_on, published_on
                 FROM contract_amendments WHERE contract_uid = ?1 ORDER BY uid",
                [c.uid],
            )
            .await?;
        let mut amendments = Vec::new();
        while let Some(row) = rows.next().await? {
            let amendment_uid = row.get::<i64>(0)?;
            amendments.push((
                amendment_uid,
                ContractAmendment {
                    id: row.get::<i64>(1)?,
                    duration_months: row.get::<Option<i64>>(2)?,
                    amount: row.get::<Option<f64>>(3)?,
                    notified_on: get_date(&row, 4)?,
                    published_on: get_date(&row, 5)?,
                    seller_uids: Vec::new(),
                },
            ));
        }
        for (amendment_uid, mut amendment) in amendments {
            amendment.seller_uids =
                load_members(conn, "contract_amendment_sellers", "amendment_uid", amendment_uid)
                    .await?;
            c.amendments.push(amendment);
        }

        let mut rows = self
            .query(
                "SELECT uid, id, subcontractor_uid, duration_months, initial_duration_months,
                        notified_on, published_on, amount, initial_amount, price_variation
                 FROM subcontracting_acts WHERE contract_uid = ?1 ORDER BY uid",
                [c.uid],
            )
            .await?;
        let mut acts = Vec::new();
        while let Some(row) = rows.next().await? {
            acts.push((
                row.get::<i64>(0)?,
                SubcontractingAct {
                    id: row.get::<i64>(1)?,
                    subcontractor_uid: row.get::<i64>(2)?,
                    duration_months: row.get::<i64>(3)?,
                    initial_duration_months: row.get::<i64>(4)?,
                    notified_on: get_date(&row, 5)?,
                    published_on: get_date(&row, 6)?,
                    amount: row.get::<f64>(7)?,
                    initial_amount: row.get::<f64>(8)?,
                    price_variation: get_opt_code(&row, 9, PriceVariation::from_code)?,
                    amendments: Vec::new(),
                },
            ));
        }
        for (act_uid, mut act) in acts {
            let mut rows = self
                .query(
                    "SELECT duration_months, amount, notified_on, published_on
                     FROM subcontracting_amendments WHERE act_uid = ?1 ORDER BY uid",
                    [act_uid],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                act.amendments.push(SubcontractingAmendment {
                    duration_months: row.get::<Option<i64>>(0)?,
                    amount: row.get::<Option<f64>>(1)?,
                    notified_on: get_date(&row, 2)?,
                    published_on: get_date(&row, 3)?,
                });
            }
            c.subcontracting_acts.push(act);
        }
        Ok(())
    }
}
