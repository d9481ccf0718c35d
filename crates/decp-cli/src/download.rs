//! Source download, scrubbed on the way to disk.

use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::sanitize::NanScrubber;

/// Stream `url` into `dest`, rewriting bare `NaN` tokens to `null` and
/// dropping bytes that are not valid UTF-8.
///
/// Returns the number of bytes received.
pub async fn download_scrubbed(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> anyhow::Result<u64> {
    info!(url, dest = %dest.display(), "downloading source");
    let mut response = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to request {url}"))?
        .error_for_status()
        .with_context(|| format!("{url} answered with an error status"))?;

    let file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("failed to create {}", dest.display()))?;
    let mut writer = BufWriter::new(file);
    let mut scrubber = NanScrubber::default();
    let mut buffer = Vec::new();
    let mut received = 0_u64;

    while let Some(chunk) = response.chunk().await? {
        received += chunk.len() as u64;
        scrubber.feed(&chunk, &mut buffer);
        writer.write_all(&buffer).await?;
        buffer.clear();
    }
    scrubber.finish(&mut buffer);
    writer.write_all(&buffer).await?;
    writer.flush().await?;

    if scrubber.dropped() > 0 {
        warn!(url, bytes = scrubber.dropped(), "dropped bytes that are not valid UTF-8");
    }

    info!(url, bytes = received, "download complete");
    Ok(received)
}
