//! Database configuration.

use serde::{Deserialize, Serialize};

/// Default number of processed items per committed batch.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

fn default_path() -> String {
    "decp.db".to_string()
}

const fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the local libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Items processed between two commits during an import.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            batch_size: default_batch_size(),
        }
    }
}
