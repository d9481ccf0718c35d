//! # decp-config
//!
//! Layered configuration loading for the DECP importer using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`DECP_*` prefix, `__` as separator)
//! 2. Project-level `./decp.toml`
//! 3. User-level `~/.config/decp/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `DECP_DATABASE__PATH` -> `database.path`,
//! `DECP_ENRICHMENT__TOKEN` -> `enrichment.token`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use decp_config::DecpConfig;
//!
//! let config = DecpConfig::load_with_dotenv().expect("config");
//! println!("importing into {}", config.database.path);
//! ```

mod database;
mod enrichment;
mod error;
mod import;

pub use database::{DEFAULT_BATCH_SIZE, DatabaseConfig};
pub use enrichment::EnrichmentConfig;
pub use error::ConfigError;
pub use import::ImportConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local configuration file.
pub const LOCAL_CONFIG_FILE: &str = "decp.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecpConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl DecpConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("DECP_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("decp").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("database.batch_size", self.database.batch_size),
            ("import.channel_capacity", self.import.channel_capacity),
            ("enrichment.commit_every", self.enrichment.commit_every),
        ];
        match sizes.into_iter().find(|&(_, value)| value == 0) {
            Some((field, _)) => Err(ConfigError::InvalidValue {
                field,
                reason: "must be at least 1",
            }),
            None => Ok(()),
        }
    }
}
