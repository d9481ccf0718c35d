pub mod cpv;
pub mod enrich;
pub mod fetch;
pub mod import;
pub mod infogreffe;
pub mod reset;
pub mod schema;

use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Import(args) => import::handle(&args, ctx, flags).await,
        Commands::Fetch(args) => fetch::handle(&args, ctx, flags).await,
        Commands::Reset(args) => reset::handle(&args, ctx, flags).await,
        Commands::Enrich => enrich::handle(ctx, flags).await,
        Commands::Cpv(args) => cpv::handle(&args, ctx, flags).await,
        Commands::Infogreffe(args) => infogreffe::handle(&args, ctx, flags).await,
        Commands::Schema(_) => unreachable!("schema is pre-dispatched in main"),
    }
}
