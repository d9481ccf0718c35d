use anyhow::Context;
use decp_enrich::{ApiEntrepriseClient, backfill_names};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `decp enrich`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let enrichment = &ctx.config.enrichment;
    let client = ApiEntrepriseClient::from_config(enrichment)
        .context("set enrichment.base_url and enrichment.token (DECP_ENRICHMENT__*)")?;

    let progress = Progress::spinner("looking up organization names");
    let report = backfill_names(&ctx.db, &client, enrichment.commit_every).await?;
    progress.finish_clear();
    output(&report, flags.format)
}
