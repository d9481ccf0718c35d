//! Errors raised while loading the `decp` configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A TOML file or environment variable could not be read into the
    /// configuration shape.
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}
