//! Schema registry error types.

use thiserror::Error;

use crate::failure::ValidationFailure;

/// Errors from the schema registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Requested schema name was not found in the registry.
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// JSON value did not pass schema validation.
    #[error(transparent)]
    Failed(#[from] ValidationFailure),

    /// Schema generation or compilation error.
    #[error("Schema generation error: {0}")]
    Generation(String),
}
