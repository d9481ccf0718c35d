use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{
    Category, Ccag, ContractNature, ContractProcedure, EnvironmentalConsideration, ExecutionMode,
    OperatorGrouping, PriceForm, PriceType, PriceVariation, PurchaseTechnique, SocialConsideration,
};

/// A contract award ("marché").
///
/// `amount`, `duration_months` and `seller_uids` hold the values after every
/// amendment has been applied; the `initial_*` fields keep the award values.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Contract {
    pub uid: i64,
    pub id: String,
    pub buyer_uid: i64,
    pub nature: ContractNature,
    pub object: String,
    pub cpv: String,
    pub category: Category,
    /// Parent framework agreement, when it appeared earlier in the same run.
    pub framework_uid: Option<i64>,
    pub innovative: bool,
    pub ccag: Option<Ccag>,
    pub offers_received: Option<i64>,
    pub advance_granted: bool,
    pub advance_rate: Option<f64>,
    pub operator_grouping: Option<OperatorGrouping>,
    pub subcontracting_declared: bool,
    pub procedure: Option<ContractProcedure>,
    pub place_uid: Option<i64>,
    pub duration_months: i64,
    pub initial_duration_months: i64,
    pub notified_on: NaiveDate,
    pub published_on: NaiveDate,
    pub amount: f64,
    pub initial_amount: f64,
    pub price_form: Option<PriceForm>,
    pub eu_origin: Option<f64>,
    pub france_origin: Option<f64>,
    pub price_types: Vec<PriceType>,
    pub execution_modes: Vec<ExecutionMode>,
    pub purchase_techniques: Vec<PurchaseTechnique>,
    pub social_considerations: Vec<SocialConsideration>,
    pub environmental_considerations: Vec<EnvironmentalConsideration>,
    pub seller_uids: Vec<i64>,
    pub amendments: Vec<ContractAmendment>,
    pub subcontracting_acts: Vec<SubcontractingAct>,
}

/// An amendment to a contract. Absent values leave the contract unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ContractAmendment {
    pub id: i64,
    pub duration_months: Option<i64>,
    pub amount: Option<f64>,
    pub notified_on: NaiveDate,
    pub published_on: NaiveDate,
    /// Replacement seller list; empty when the amendment keeps the sellers.
    pub seller_uids: Vec<i64>,
}

/// A subcontracting act declared on a contract.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SubcontractingAct {
    /// Sequence id, unique within the parent contract.
    pub id: i64,
    pub subcontractor_uid: i64,
    pub duration_months: i64,
    pub initial_duration_months: i64,
    pub notified_on: NaiveDate,
    pub published_on: NaiveDate,
    pub amount: f64,
    pub initial_amount: f64,
    pub price_variation: Option<PriceVariation>,
    pub amendments: Vec<SubcontractingAmendment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SubcontractingAmendment {
    pub duration_months: Option<i64>,
    pub amount: Option<f64>,
    pub notified_on: NaiveDate,
    pub published_on: NaiveDate,
}
