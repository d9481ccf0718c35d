//! Enrichment error types.

use decp_db::error::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("parse error: {0}")]
    Parse(String),

    /// Base URL or token missing from the configuration.
    #[error("company registry is not configured")]
    NotConfigured,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
