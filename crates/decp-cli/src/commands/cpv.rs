use std::path::Path;

use anyhow::Context;
use decp_core::responses::CpvImportReport;
use decp_db::DecpDb;
use decp_db::repos::cpv::parse_cpv_file;
use tracing::info;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CpvArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `decp cpv`.
pub async fn handle(args: &CpvArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = load(&ctx.db, &args.file).await?;
    output(&report, flags.format)
}

/// Replace the CPV table with the nomenclature in `path`.
pub async fn load(db: &DecpDb, path: &Path) -> anyhow::Result<CpvImportReport> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let entries = parse_cpv_file(&bytes)
        .with_context(|| format!("{} is not a CPV nomenclature", path.display()))?;
    let codes = db.replace_cpv(&entries).await?;
    info!(codes, "CPV nomenclature loaded");
    Ok(CpvImportReport { codes })
}
