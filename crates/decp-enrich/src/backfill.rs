//! Name backfill for organizations imported without registry details.

use std::time::Instant;

use decp_core::responses::EnrichmentReport;
use decp_db::DecpDb;
use decp_db::repos::organization::OrganizationDetails;
use tracing::{info, warn};

use crate::error::EnrichError;
use crate::{CompanyRecord, OrganizationDirectory};

/// Look up every unnamed SIRET organization, newest first, and store what the
/// directory returns.
///
/// Updates are written every `commit_every` organizations (at least 1). A
/// failed lookup is logged and skipped; the organization stays unnamed and is
/// retried on the next run.
///
/// # Errors
///
/// Returns [`EnrichError::Database`] if the candidates cannot be listed or an
/// update fails. Updates committed before the failure stay.
pub async fn backfill_names<D: OrganizationDirectory>(
    db: &DecpDb,
    directory: &D,
    commit_every: usize,
) -> Result<EnrichmentReport, EnrichError> {
    let started = Instant::now();
    let commit_every = commit_every.max(1);
    let candidates = db.list_unnamed_siret_organizations().await?;
    info!(candidates = candidates.len(), "organizations without a name");

    let mut pending = Vec::new();
    let mut updated = 0_u64;
    let mut not_found = 0_u64;
    let mut failed = 0_u64;

    for org in &candidates {
        match directory.lookup(&org.identifier).await {
            Ok(Some(record)) => pending.push(details(org.uid, record)),
            Ok(None) => not_found += 1,
            Err(e) => {
                warn!(siret = %org.identifier, error = %e, "company registry lookup failed");
                failed += 1;
            }
        }
        if pending.len() >= commit_every {
            updated += db.update_organization_details(&pending).await?;
            info!(updated, "enrichment committed");
            pending.clear();
        }
    }
    updated += db.update_organization_details(&pending).await?;

    Ok(EnrichmentReport {
        candidates: candidates.len() as u64,
        updated,
        not_found,
        failed,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

fn details(uid: i64, record: CompanyRecord) -> OrganizationDetails {
    OrganizationDetails {
        uid,
        name: record.name,
        size_category: record.size_category,
        longitude: record.longitude,
        latitude: record.latitude,
    }
}
