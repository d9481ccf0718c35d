use anyhow::Context;
use decp_config::DecpConfig;
use decp_db::DecpDb;
use decp_schema::SchemaRegistry;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: DecpConfig,
    pub db: DecpDb,
    pub registry: SchemaRegistry,
}

impl AppContext {
    /// Open the configured database (running migrations) and compile the
    /// input schemas.
    pub async fn init(config: DecpConfig) -> anyhow::Result<Self> {
        let db = DecpDb::open_local(&config.database.path)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;
        let registry = SchemaRegistry::new().context("failed to build the schema registry")?;
        Ok(Self {
            config,
            db,
            registry,
        })
    }
}
