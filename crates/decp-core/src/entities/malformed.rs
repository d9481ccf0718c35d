use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RecordKind;

/// A rejected input item, kept verbatim with the reasons it was rejected.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MalformedRecord {
    pub uid: i64,
    pub kind: RecordKind,
    /// Exact source text of the item.
    pub payload: String,
    /// Buyer or granting authority, when the raw item names one.
    pub organization_uid: Option<i64>,
    /// Notification or signature date, when the raw item carries a valid one.
    pub created_on: Option<NaiveDate>,
    pub errors: Vec<RecordError>,
}

/// One reason an item was rejected.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RecordError {
    /// Error kind, e.g. `missing`, `pattern_mismatch`, `incoherence`.
    pub kind: String,
    /// Dotted field path with list indices left out.
    pub location: String,
    pub message: String,
}
