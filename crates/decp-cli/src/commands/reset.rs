use crate::cli::GlobalFlags;
use crate::cli::root_commands::ResetArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `decp reset`.
pub async fn handle(args: &ResetArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = ctx.db.reset(!args.all).await?;
    output(&response, flags.format)
}
