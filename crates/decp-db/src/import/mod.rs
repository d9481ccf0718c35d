//! Streaming import of DECP documents.
//!
//! A run reads one record array of a DECP document item by item, validates
//! each item, turns valid ones into the relational entity graph and rejected
//! ones into malformed records, and commits the staged work every
//! `batch_size` items:
//!
//! ```text
//! ItemStream ──► SchemaRegistry ──► RecordTransformer ──► PendingBatch ──► DecpDb
//!                     │ rejected          (EntityResolver)       ▲
//!                     └──────────► error sink ───────────────────┘
//! ```
//!
//! Validation failures are per item and never stop a run. Anything else
//! (I/O, unreadable JSON, storage) is fatal and leaves the in-flight batch
//! uncommitted.

pub mod batch;
pub mod driver;
pub mod resolver;
mod sink;
pub mod stream;
pub mod transformer;
pub mod utf8;

use decp_schema::{SchemaError, ValidationFailure};
use thiserror::Error;

use crate::error::DatabaseError;

pub use batch::PendingBatch;
pub use driver::Importer;
pub use resolver::{EntityResolver, Role, UidSequence};
pub use stream::ItemStream;
pub use transformer::RecordTransformer;
pub use utf8::{Utf8Filter, Utf8FilterReader};

/// Errors raised while importing one document.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The item failed validation or a cross-reference check.
    ///
    /// The only recoverable variant: the driver routes it to the error sink.
    #[error(transparent)]
    Rejected(#[from] ValidationFailure),

    /// The schema registry itself is unusable.
    #[error("schema registry: {0}")]
    Schema(SchemaError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The document is not well-formed JSON or could not be read.
    #[error("JSON stream: {0}")]
    Stream(#[from] serde_json::Error),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SchemaError> for ImportError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Failed(failure) => Self::Rejected(failure),
            other => Self::Schema(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_failures_are_rejections() {
        let err = ImportError::from(SchemaError::Failed(ValidationFailure::incoherence(
            "modificationsActesSousTraitance",
            "missing act",
        )));
        assert!(matches!(err, ImportError::Rejected(_)));
    }

    #[test]
    fn missing_schema_is_fatal() {
        let err = ImportError::from(SchemaError::NotFound("decp_marche".to_string()));
        assert!(matches!(err, ImportError::Schema(_)));
    }
}
