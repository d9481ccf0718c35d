//! Integration tests for TOML and environment configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use decp_config::{ConfigError, DecpConfig};
use figment::Jail;
use pretty_assertions::assert_eq;

#[test]
fn loads_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "decp.toml",
            r#"
[database]
path = "/var/lib/decp/decp.db"
batch_size = 5000

[import]
sources = [
    "https://example.org/decp-2019.json",
    "https://example.org/decp-2024.json",
]
work_dir = "/tmp/decp"
cpv_file = "cpv_2008_fr.csv"

[enrichment]
base_url = "https://entreprise.example.org/v3"
token = "tok"
commit_every = 100
"#,
        )?;

        let config = DecpConfig::load().expect("config loads");
        assert_eq!(config.database.path, "/var/lib/decp/decp.db");
        assert_eq!(config.database.batch_size, 5000);
        assert_eq!(config.import.sources.len(), 2);
        assert_eq!(config.import.work_dir, "/tmp/decp");
        assert_eq!(config.import.cpv_file.as_deref(), Some("cpv_2008_fr.csv"));
        assert_eq!(config.import.channel_capacity, 1_024);
        assert!(config.enrichment.is_configured());
        assert_eq!(config.enrichment.commit_every, 100);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file("decp.toml", "[database]\npath = \"from-file.db\"\n")?;
        jail.set_env("DECP_DATABASE__PATH", "from-env.db");
        jail.set_env("DECP_ENRICHMENT__TOKEN", "secret");

        let config = DecpConfig::load().expect("config loads");
        assert_eq!(config.database.path, "from-env.db");
        assert_eq!(config.enrichment.token, "secret");
        Ok(())
    });
}

#[test]
fn defaults_without_any_source() {
    Jail::expect_with(|_jail| {
        let config = DecpConfig::load().expect("config loads");
        assert_eq!(config.database.path, "decp.db");
        assert!(!config.import.has_sources());
        Ok(())
    });
}

#[test]
fn invalid_batch_size_is_reported() {
    Jail::expect_with(|jail| {
        jail.set_env("DECP_DATABASE__BATCH_SIZE", "0");
        let err = DecpConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}

#[test]
fn unreadable_value_is_a_load_error() {
    Jail::expect_with(|jail| {
        jail.set_env("DECP_DATABASE__BATCH_SIZE", "lots");
        let err = DecpConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        Ok(())
    });
}
