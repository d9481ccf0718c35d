//! Response types returned by the importer and printed as JSON by `decp`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RecordKind;

/// Outcome of one import run over one record kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunStats {
    pub kind: RecordKind,
    pub valid: u64,
    pub invalid: u64,
    /// Share of invalid items, in percent of all processed items.
    pub invalid_percent: f64,
    pub batches_committed: u64,
    pub elapsed_ms: u64,
}

impl RunStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(
        kind: RecordKind,
        valid: u64,
        invalid: u64,
        batches_committed: u64,
        elapsed_ms: u64,
    ) -> Self {
        let total = valid + invalid;
        let invalid_percent = if total == 0 {
            0.0
        } else {
            invalid as f64 * 100.0 / total as f64
        };
        Self {
            kind,
            valid,
            invalid,
            invalid_percent,
            batches_committed,
            elapsed_ms,
        }
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.valid + self.invalid
    }
}

/// Outcome of `decp enrich`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub candidates: u64,
    pub updated: u64,
    pub not_found: u64,
    pub failed: u64,
    pub elapsed_ms: u64,
}

/// Outcome of `decp reset`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ResetResponse {
    pub tables_cleared: Vec<String>,
    pub kept_reference_data: bool,
}

/// Outcome of `decp cpv`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CpvImportReport {
    pub codes: u64,
}

/// Outcome of `decp infogreffe`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FinancialsImportReport {
    /// Data rows in the file.
    pub rows: u64,
    /// Rows whose SIRET belongs to a known organization.
    pub matched: u64,
    /// Financial years stored.
    pub years: u64,
    pub batches_committed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_percent_of_total() {
        let stats = RunStats::new(RecordKind::Marche, 3, 1, 1, 10);
        assert_eq!(stats.total(), 4);
        assert!((stats.invalid_percent - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_run_has_no_percentage() {
        let stats = RunStats::new(RecordKind::Concession, 0, 0, 0, 0);
        assert!(stats.invalid_percent.abs() < f64::EPSILON);
    }
}
