use anyhow::Context;
use decp_db::import::Importer;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImportArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `decp import`.
pub async fn handle(args: &ImportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    if !args.file.is_file() {
        anyhow::bail!("{} is not a file", args.file.display());
    }
    let batch_size = args.batch_size.unwrap_or(ctx.config.database.batch_size);
    let capacity = ctx.config.import.channel_capacity;

    let mut importer = Importer::new(&ctx.db, &ctx.registry)
        .await
        .context("failed to preload organizations and places")?;
    let mut runs = Vec::new();
    for kind in args.kind.record_kinds() {
        let progress = Progress::spinner(&format!("importing {kind} records"));
        let stats = importer
            .import_file(&args.file, kind, batch_size, capacity)
            .await
            .with_context(|| format!("{kind} import of {} failed", args.file.display()))?;
        progress.finish_clear();
        runs.push(stats);
    }
    output(&runs, flags.format)
}
