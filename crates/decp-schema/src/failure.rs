//! Structured validation failures.
//!
//! A `ValidationFailure` is the only error a single record can raise. It is
//! always recoverable: the importer stores it next to the raw item and moves
//! on to the next one.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error kind for a reference between two parts of the same record that does
/// not resolve (e.g. an amendment to a subcontracting act that is not declared).
pub const INCOHERENCE: &str = "incoherence";

/// One step of a field path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A single field-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Machine-readable error kind (`missing`, `greater_than_equal`, ...).
    pub kind: String,
    /// Path from the record root to the offending value.
    pub loc: Vec<LocSegment>,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(kind: impl Into<String>, loc: Vec<LocSegment>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            loc,
            message: message.into(),
        }
    }

    /// Dotted path with list indices left out, e.g. `titulaires.titulaire.id`.
    #[must_use]
    pub fn location(&self) -> String {
        self.loc
            .iter()
            .filter_map(|s| match s {
                LocSegment::Key(k) => Some(k.as_str()),
                LocSegment::Index(_) => None,
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Every error found while validating one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("record rejected with {} error(s): {}", .errors.len(), summarize(.errors))]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// A cross-reference inside the record that does not resolve.
    #[must_use]
    pub fn incoherence(field: &str, message: &str) -> Self {
        Self::new(vec![FieldError::new(
            INCOHERENCE,
            vec![LocSegment::Key(field.to_string())],
            message,
        )])
    }

    /// A value the schema accepted but the typed record could not hold.
    #[must_use]
    pub fn parsing(err: &serde_json::Error) -> Self {
        Self::new(vec![FieldError::new("parsing", Vec::new(), err.to_string())])
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .first()
        .map(|e| format!("{} at '{}': {}", e.kind, e.location(), e.message))
        .unwrap_or_default()
}

/// Split a JSON pointer (`/titulaires/0/titulaire/id`) into path segments.
///
/// The pointer is walked through `instance`: a token is an index only when it
/// addresses an array, so an object key made of digits stays a key.
pub(crate) fn pointer_to_loc(pointer: &str, instance: &Value) -> Vec<LocSegment> {
    let mut node = Some(instance);
    pointer
        .split('/')
        .skip(1)
        .map(|raw| {
            let token = raw.replace("~1", "/").replace("~0", "~");
            let index = match node {
                Some(Value::Array(_)) => token.parse::<usize>().ok(),
                _ => None,
            };
            node = node.and_then(|n| match index {
                Some(i) => n.get(i),
                None => n.get(token.as_str()),
            });
            index.map_or(LocSegment::Key(token), LocSegment::Index)
        })
        .collect()
}
