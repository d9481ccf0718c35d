//! Cross-cutting error types for the DECP crates.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `SchemaError`) are defined in
//! their respective crates. The CLI converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any DECP crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A persisted code has no entry in its code table.
    ///
    /// This is a configuration error (stored data and binary disagree), never
    /// an input problem, and aborts whatever operation hit it.
    #[error("Unknown code {code} in table {table}")]
    UnknownCode { table: &'static str, code: i64 },

    /// A label has no entry in its code table.
    #[error("Unknown label '{label}' in table {table}")]
    UnknownLabel { table: &'static str, label: String },
}
