//! Feed download and import configuration.

use serde::{Deserialize, Serialize};

fn default_work_dir() -> String {
    ".".to_string()
}

/// Items buffered between the JSON reader thread and the importer.
const fn default_channel_capacity() -> usize {
    1_024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// URLs of the consolidated DECP JSON documents, imported in order.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Directory receiving downloaded and sanitized files.
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// CPV nomenclature CSV loaded after a from-scratch reset.
    #[serde(default)]
    pub cpv_file: Option<String>,
}

impl ImportConfig {
    #[must_use]
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            work_dir: default_work_dir(),
            channel_capacity: default_channel_capacity(),
            cpv_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ImportConfig::default();
        assert!(!config.has_sources());
        assert_eq!(config.work_dir, ".");
        assert_eq!(config.channel_capacity, 1_024);
        assert!(config.cpv_file.is_none());
    }
}
