use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::IdentifierKind;

/// A buyer, seller, subcontractor, or granting authority.
///
/// Unique per `(identifier, identifier_kind)`. Role flags only ever go from
/// `false` to `true`. Name, size category and coordinates come from
/// enrichment, never from the feed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Organization {
    pub uid: i64,
    pub identifier: String,
    pub identifier_kind: IdentifierKind,
    pub is_buyer: bool,
    pub is_seller: bool,
    pub name: Option<String>,
    pub size_category: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl Organization {
    /// A freshly discovered organization with no role and no enrichment.
    #[must_use]
    pub const fn new(uid: i64, identifier: String, identifier_kind: IdentifierKind) -> Self {
        Self {
            uid,
            identifier,
            identifier_kind,
            is_buyer: false,
            is_seller: false,
            name: None,
            size_category: None,
            longitude: None,
            latitude: None,
        }
    }
}
