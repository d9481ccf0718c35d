use std::path::Path;

use anyhow::Context;
use decp_core::responses::FinancialsImportReport;
use decp_db::DecpDb;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InfogreffeArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `decp infogreffe`.
pub async fn handle(
    args: &InfogreffeArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let report = load(&ctx.db, &args.file, ctx.config.database.batch_size).await?;
    output(&report, flags.format)
}

/// Replace the stored key figures with those of the export in `path`.
pub async fn load(
    db: &DecpDb,
    path: &Path,
    batch_size: usize,
) -> anyhow::Result<FinancialsImportReport> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let report = db
        .load_financials(bytes.as_slice(), batch_size)
        .await
        .with_context(|| format!("failed to load key figures from {}", path.display()))?;
    Ok(report)
}
