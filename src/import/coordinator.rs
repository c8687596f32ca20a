//! Import coordination for message history runs.
//!
//! The MessageImporter drives one run end to end:
//! 1. Size batches (configured override or [`batch_size_for`])
//! 2. Start the job and take its cancellation token
//! 3. Per batch: resolve every record, persist the batch, count outcomes
//! 4. Feed progress into the job after each batch
//! 5. Close the job as completed, cancelled or failed

use std::sync::Arc;

use crate::config::ImportConfig;
use crate::error::Result;
use crate::import::batch_size::batch_size_for;
use crate::import::chunked::{self, ChunkOptions, run_chunks};
use crate::import::jobs::ImportJob;
use crate::import::stats::ImportStats;
use crate::import::store::MessageStore;
use crate::models::{ImportedMessage, RawMessageRecord};
use crate::resolver::{ExtractionCache, MessageTextResolver};

/// Summary of one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub job_id: String,
    pub stats: ImportStats,
    pub batch_size: usize,
    pub batches_processed: usize,
    pub total_batches: usize,
    pub cancelled: bool,
}

/// Resolves raw message rows and hands them to a [`MessageStore`] in batches.
pub struct MessageImporter<S> {
    store: S,
    resolver: MessageTextResolver,
    batch_size: Option<usize>,
}

impl<S: MessageStore> MessageImporter<S> {
    pub fn new(store: S, resolver: MessageTextResolver) -> Self {
        Self {
            store,
            resolver,
            batch_size: None,
        }
    }

    /// Build an importer from configuration, creating its extraction cache if enabled.
    pub fn from_config(store: S, config: &ImportConfig) -> Self {
        let resolver = if config.extraction_cache {
            let cache = match config.cache_max_entries {
                Some(limit) => ExtractionCache::with_max_entries(limit),
                None => ExtractionCache::new(),
            };
            MessageTextResolver::new(Arc::new(cache))
        } else {
            MessageTextResolver::uncached()
        };

        Self {
            store,
            resolver,
            batch_size: config.batch_size,
        }
    }

    /// Use a fixed batch size instead of sizing from the record count.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &MessageTextResolver {
        &self.resolver
    }

    /// Import `records` under `job`.
    ///
    /// Returns a report for completed and cancelled runs alike. A store
    /// failure marks the job failed and is returned as the error.
    pub async fn import(
        &self,
        records: &[RawMessageRecord],
        job: &ImportJob,
    ) -> Result<ImportReport> {
        let batch_size = self
            .batch_size
            .unwrap_or_else(|| batch_size_for(records.len()))
            .max(1);
        let total_batches = chunked::total_batches(records.len(), batch_size);
        let job_id = job.start(records.len(), total_batches)?;

        log::info!(
            "job {}: importing {} messages in {} batches of {}",
            job_id,
            records.len(),
            total_batches,
            batch_size
        );

        let total_records = records.len();
        let options = ChunkOptions::new(batch_size)
            .with_cancellation(job.cancellation_token())
            .with_progress(|completed, total| {
                let processed = (completed * batch_size).min(total_records);
                job.update_progress(completed, processed);
                log::debug!("job {}: batch {}/{} done", job_id, completed, total);
            });

        let outcome = run_chunks(records, options, |batch| self.import_batch(batch)).await;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                log::error!("job {}: import failed: {}", job_id, e);
                job.fail(e.to_string());
                return Err(e);
            }
        };

        let mut stats = ImportStats::default();
        for batch_stats in result.results {
            stats.merge(batch_stats);
        }
        if result.cancelled {
            log::info!(
                "job {}: cancelled after {}/{} batches ({} messages imported)",
                job_id,
                result.batches_processed,
                result.total_batches,
                stats.total()
            );
            job.mark_cancelled(stats.clone());
        } else {
            log::info!(
                "job {}: imported {} messages ({} extracted, {} unable to parse)",
                job_id,
                stats.total(),
                stats.extracted,
                stats.unable_to_parse
            );
            job.complete(stats.clone());
        }

        if let Some(cache) = self.resolver.cache() {
            let cache_stats = cache.stats();
            log::debug!(
                "job {}: extraction cache {} entries, {} hits, {} misses",
                job_id,
                cache_stats.entries,
                cache_stats.hits,
                cache_stats.misses
            );
        }

        Ok(ImportReport {
            job_id,
            stats,
            batch_size,
            batches_processed: result.batches_processed,
            total_batches: result.total_batches,
            cancelled: result.cancelled,
        })
    }

    /// Resolve and persist one batch, returning its stats as a single entry.
    async fn import_batch(&self, batch: &[RawMessageRecord]) -> Result<Vec<ImportStats>> {
        let messages: Vec<ImportedMessage> = batch
            .iter()
            .map(|record| ImportedMessage::new(record.id, self.resolver.resolve(record)))
            .collect();

        self.store.persist(&messages).await?;

        let stats: ImportStats = messages.iter().map(|message| message.source).collect();
        Ok(vec![stats])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::jobs::JobStatus;
    use crate::import::store::MemoryStore;

    fn records(count: usize) -> Vec<RawMessageRecord> {
        (0..count)
            .map(|i| RawMessageRecord {
                id: i as i64,
                text: Some(format!("message {i}")),
                attributed_body: None,
                attachment_count: 0,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_import_completes_and_reports() {
        let importer = MessageImporter::new(MemoryStore::new(), MessageTextResolver::uncached())
            .with_batch_size(4);
        let job = ImportJob::new();

        let report = importer.import(&records(10), &job).await.unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.total_batches, 3);
        assert_eq!(report.batches_processed, 3);
        assert_eq!(report.stats.verbatim, 10);
        assert_eq!(importer.store().len(), 10);

        let state = job.state();
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.progress.messages_processed, 10);
        assert_eq!(state.progress.batches_completed, 3);
    }

    #[tokio::test]
    async fn test_default_batch_size_comes_from_sizer() {
        let importer = MessageImporter::new(MemoryStore::new(), MessageTextResolver::uncached());
        let job = ImportJob::new();

        let report = importer.import(&records(25), &job).await.unwrap();

        assert_eq!(report.batch_size, batch_size_for(25));
        assert_eq!(report.total_batches, 1);
    }

    #[tokio::test]
    async fn test_empty_import_completes() {
        let importer = MessageImporter::new(MemoryStore::new(), MessageTextResolver::uncached());
        let job = ImportJob::new();

        let report = importer.import(&[], &job).await.unwrap();

        assert_eq!(report.total_batches, 0);
        assert_eq!(report.stats.total(), 0);
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn test_from_config_respects_cache_toggle() {
        let config = ImportConfig {
            extraction_cache: false,
            batch_size: Some(7),
            ..ImportConfig::default()
        };
        let importer = MessageImporter::from_config(MemoryStore::new(), &config);

        assert!(importer.resolver().cache().is_none());
        assert_eq!(importer.batch_size, Some(7));
    }
}
