use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Key figures filed with the commercial court registry for one financial
/// year of an organization.
///
/// At least one of the three figures is present.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct OrganizationFinancials {
    pub organization_uid: i64,
    pub year: i32,
    /// Turnover in euros.
    pub turnover: Option<f64>,
    /// Net result in euros, negative for a loss.
    pub net_income: Option<f64>,
    pub headcount: Option<i64>,
}
