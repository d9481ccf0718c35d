use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::PlaceKind;

/// An execution place. Unique per `(code, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Place {
    pub uid: i64,
    pub code: String,
    pub kind: PlaceKind,
}
