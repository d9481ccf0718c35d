use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{
    ConcessionNature, ConcessionProcedure, EnvironmentalConsideration, SocialConsideration,
};

/// A concession contract.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Concession {
    pub uid: i64,
    pub id: String,
    pub authority_uid: i64,
    pub nature: ConcessionNature,
    pub object: String,
    pub procedure: ConcessionProcedure,
    pub duration_months: i64,
    pub initial_duration_months: i64,
    pub signed_on: NaiveDate,
    pub published_on: NaiveDate,
    pub execution_starts_on: NaiveDate,
    pub global_value: f64,
    pub initial_global_value: f64,
    pub public_subsidy: f64,
    pub social_considerations: Vec<SocialConsideration>,
    pub environmental_considerations: Vec<EnvironmentalConsideration>,
    pub concessionaire_uids: Vec<i64>,
    pub amendments: Vec<ConcessionAmendment>,
    pub execution_data: Vec<ExecutionData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ConcessionAmendment {
    pub id: i64,
    pub signed_on: NaiveDate,
    pub published_on: NaiveDate,
    pub duration_months: Option<i64>,
    pub global_value: Option<f64>,
}

/// Yearly execution report of a concession.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExecutionData {
    pub published_on: NaiveDate,
    pub investment_spending: f64,
    pub tariffs: Vec<Tariff>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Tariff {
    pub label: String,
    pub amount: f64,
}
