use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use decp_core::enums::RecordKind;
use decp_db::import::Importer;
use serde_json::json;
use tracing::{info, warn};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::FetchArgs;
use crate::commands::cpv;
use crate::context::AppContext;
use crate::download::download_scrubbed;
use crate::output::output;
use crate::progress::Progress;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle `decp fetch`.
///
/// Every source is downloaded, imported (contract awards then concessions)
/// and deleted before the next one starts. One importer serves the whole run,
/// so organizations shared between sources are created once.
pub async fn handle(args: &FetchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let import = &ctx.config.import;
    if !import.has_sources() {
        anyhow::bail!("no source configured (import.sources / DECP_IMPORT__SOURCES)");
    }

    let reset = ctx.db.reset(!args.from_scratch).await?;
    let cpv = match (&import.cpv_file, args.from_scratch) {
        (Some(path), true) => Some(cpv::load(&ctx.db, Path::new(path)).await?),
        _ => None,
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("decp/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    let mut importer = Importer::new(&ctx.db, &ctx.registry)
        .await
        .context("failed to preload organizations and places")?;

    info!(sources = import.sources.len(), "fetching sources");
    let mut runs = Vec::new();
    for (index, url) in import.sources.iter().enumerate() {
        let dest = source_path(&import.work_dir, index);
        let progress = Progress::spinner(&format!("downloading {url}"));
        let stats = removing_afterwards(&dest, async {
            download_scrubbed(&http, url, &dest).await?;
            let mut stats = Vec::new();
            for kind in [RecordKind::Marche, RecordKind::Concession] {
                progress.set_message(&format!("importing {kind} records from {url}"));
                stats.push(
                    importer
                        .import_file(
                            &dest,
                            kind,
                            ctx.config.database.batch_size,
                            import.channel_capacity,
                        )
                        .await
                        .with_context(|| format!("{kind} import of {url} failed"))?,
                );
            }
            Ok(stats)
        })
        .await?;
        progress.finish_clear();
        runs.extend(stats.into_iter().map(|s| json!({ "source": url, "stats": s })));
    }

    output(
        &json!({
            "reset": reset,
            "cpv": cpv,
            "runs": runs,
        }),
        flags.format,
    )
}

/// Run `work`, then delete the downloaded file whether it succeeded or not.
async fn removing_afterwards<T>(
    path: &Path,
    work: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    let result = work.await;
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), %error, "failed to remove downloaded file"),
    }
    result
}

fn source_path(work_dir: &str, index: usize) -> PathBuf {
    Path::new(work_dir).join(format!("decp-source-{index}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_file_per_source() {
        assert_eq!(
            source_path("/var/tmp", 2),
            PathBuf::from("/var/tmp/decp-source-2.json")
        );
        assert_ne!(source_path(".", 0), source_path(".", 1));
    }

    #[tokio::test]
    async fn download_is_removed_when_the_import_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dest = source_path(dir.path().to_str().unwrap(), 0);
        std::fs::write(&dest, b"{\"marches\": ").unwrap();

        let result: anyhow::Result<()> =
            removing_afterwards(&dest, async { anyhow::bail!("import failed") }).await;
        assert_eq!(result.unwrap_err().to_string(), "import failed");
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn download_is_removed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let dest = source_path(dir.path().to_str().unwrap(), 1);
        std::fs::write(&dest, b"{}").unwrap();

        let value = removing_afterwards(&dest, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn missing_download_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = source_path(dir.path().to_str().unwrap(), 2);
        assert!(removing_afterwards(&dest, async { Ok(()) }).await.is_ok());
    }
}
