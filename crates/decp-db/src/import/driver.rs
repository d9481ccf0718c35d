//! The import run loop.

use std::path::Path;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info};

use decp_core::enums::RecordKind;
use decp_core::responses::RunStats;
use decp_schema::SchemaRegistry;

use super::ImportError;
use super::stream::ItemStream;
use super::transformer::RecordTransformer;
use crate::DecpDb;

/// Imports DECP documents into one store.
///
/// The transformer, and with it the entity cache and the framework index,
/// lives as long as the importer: importing contract awards then concessions
/// with the same importer shares organizations between both runs.
pub struct Importer<'a> {
    db: &'a DecpDb,
    registry: &'a SchemaRegistry,
    transformer: RecordTransformer,
}

impl<'a> Importer<'a> {
    /// Prepare an importer, preloading the store's organizations and places.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Database` if the preload fails.
    pub async fn new(db: &'a DecpDb, registry: &'a SchemaRegistry) -> Result<Self, ImportError> {
        let transformer = RecordTransformer::preload(db).await?;
        Ok(Self {
            db,
            registry,
            transformer,
        })
    }

    #[must_use]
    pub const fn transformer(&self) -> &RecordTransformer {
        &self.transformer
    }

    /// Import the record array of `kind` from a document on disk.
    ///
    /// `capacity` bounds the items parsed ahead of the run loop.
    ///
    /// # Errors
    ///
    /// See [`Importer::import`].
    pub async fn import_file(
        &mut self,
        path: &Path,
        kind: RecordKind,
        batch_size: usize,
        capacity: usize,
    ) -> Result<RunStats, ImportError> {
        info!(path = %path.display(), kind = kind.as_str(), batch_size, "importing document");
        let stream = ItemStream::open(path, kind.item_path(), capacity)?;
        self.import(stream, kind, batch_size).await
    }

    /// Consume `stream`, committing every `batch_size` items.
    ///
    /// Rejected items become malformed records and count as invalid. A
    /// `batch_size` of 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: unreadable input, an unusable schema
    /// registry, or a failed write. Batches committed before it stay.
    pub async fn import(
        &mut self,
        mut stream: ItemStream,
        kind: RecordKind,
        batch_size: usize,
    ) -> Result<RunStats, ImportError> {
        let started = Instant::now();
        let batch_size = batch_size.max(1);
        let mut valid = 0_u64;
        let mut invalid = 0_u64;
        let mut batches = 0_u64;
        let mut in_batch = 0_usize;

        while let Some(item) = stream.next().await {
            let raw = item?;
            let value: Value = serde_json::from_str(raw.get())?;
            match self.transform(kind, &value) {
                Ok(()) => valid += 1,
                Err(ImportError::Rejected(failure)) => {
                    self.transformer.reject(kind, &raw, &value, &failure);
                    invalid += 1;
                }
                Err(e) => return Err(e),
            }

            in_batch += 1;
            if in_batch == batch_size {
                batches += self.flush().await?;
                in_batch = 0;
            }
        }
        batches += self.flush().await?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let stats = RunStats::new(kind, valid, invalid, batches, elapsed_ms);
        if stats.total() > 0 {
            info!(
                kind = kind.as_str(),
                valid = stats.valid,
                invalid = stats.invalid,
                invalid_percent = format_args!("{:.2}", stats.invalid_percent),
                batches = stats.batches_committed,
                elapsed_ms,
                "import finished"
            );
        }
        Ok(stats)
    }

    fn transform(&mut self, kind: RecordKind, value: &Value) -> Result<(), ImportError> {
        match kind {
            RecordKind::Marche => {
                let record = self.registry.parse_marche(value)?;
                self.transformer.transform_marche(record)?;
            }
            RecordKind::Concession => {
                let record = self.registry.parse_concession(value)?;
                self.transformer.transform_concession(record)?;
            }
        }
        Ok(())
    }

    /// Commit whatever is staged. Returns the number of commits (0 or 1).
    async fn flush(&mut self) -> Result<u64, ImportError> {
        let batch = self.transformer.take_batch();
        if batch.is_empty() {
            return Ok(0);
        }
        debug!(
            items = batch.item_count(),
            organizations = batch.new_organizations.len(),
            places = batch.new_places.len(),
            "committing batch"
        );
        self.db.write_batch(&batch).await?;
        Ok(1)
    }
}
