//! # decp-enrich
//!
//! Fills in organization details the procurement feed does not carry.
//!
//! Records only identify organizations by SIRET or another registry key. The
//! display name, size category and coordinates come from a company registry,
//! looked up through an [`OrganizationDirectory`]. [`ApiEntrepriseClient`] is
//! the HTTP implementation; [`backfill_names`] walks every unnamed SIRET
//! organization of the store.

mod api_entreprise;
mod backfill;
mod error;
mod http;

pub use api_entreprise::ApiEntrepriseClient;
pub use backfill::backfill_names;
pub use error::EnrichError;

use std::future::Future;

/// What the registry knows about one establishment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyRecord {
    pub name: Option<String>,
    pub size_category: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// A source of company details keyed by SIRET.
pub trait OrganizationDirectory {
    /// Look up one establishment. `Ok(None)` when the registry has no entry.
    fn lookup(
        &self,
        siret: &str,
    ) -> impl Future<Output = Result<Option<CompanyRecord>, EnrichError>> + Send;
}
