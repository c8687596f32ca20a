use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use message_import::import::{ImportJob, JobStatus, MemoryStore, MessageImporter, MessageStore};
use message_import::models::{
    ATTACHMENT_SENTINEL, ImportedMessage, REACTION_OR_SYSTEM_SENTINEL, RawMessageRecord,
    TextSource, UNABLE_TO_PARSE_SENTINEL,
};
use message_import::resolver::ExtractionCache;
use message_import::test_support::{KeyedArchiveBuilder, StreamedPayloadBuilder};
use message_import::{ImportError, MessageTextResolver};

fn record(
    id: i64,
    text: Option<&str>,
    body: Option<Vec<u8>>,
    attachments: u32,
) -> RawMessageRecord {
    RawMessageRecord {
        id,
        text: text.map(str::to_string),
        attributed_body: body,
        attachment_count: attachments,
    }
}

fn mixed_records() -> Vec<RawMessageRecord> {
    let mut archive = KeyedArchiveBuilder::new();
    archive.push_class("NSMutableAttributedString");
    archive.push_string("__kIMMessagePartAttributeName");
    archive.push_string_object("Pick up milk on the way home");
    let streamed = StreamedPayloadBuilder::new()
        .string("Running late, start without me")
        .build();

    vec![
        record(1, Some("  plain text row  "), None, 0),
        record(2, None, Some(archive.build()), 0),
        record(3, None, Some(streamed), 0),
        record(4, None, Some(b"garbage that is neither format".to_vec()), 0),
        record(5, None, None, 2),
        record(6, None, None, 0),
        record(7, Some("   "), None, 1),
        record(8, None, Some(Vec::new()), 1),
    ]
}

/// Fails every persist after the first `ok_batches`.
struct FlakyStore {
    ok_batches: usize,
    calls: AtomicUsize,
}

impl MessageStore for FlakyStore {
    async fn persist(&self, _batch: &[ImportedMessage]) -> message_import::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.ok_batches {
            return Err(ImportError::Store("database is locked".to_string()));
        }
        Ok(())
    }
}

/// Requests cancellation on the job once a set number of batches is stored.
struct StoppingStore {
    inner: MemoryStore,
    job: Arc<ImportJob>,
    stop_after: usize,
    calls: AtomicUsize,
}

impl MessageStore for StoppingStore {
    async fn persist(&self, batch: &[ImportedMessage]) -> message_import::Result<()> {
        self.inner.persist(batch).await?;
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.stop_after {
            self.job.cancel();
        }
        Ok(())
    }
}

#[tokio::test]
async fn mixed_rows_resolve_to_expected_text() {
    let importer = MessageImporter::new(MemoryStore::new(), MessageTextResolver::uncached())
        .with_batch_size(3);
    let job = ImportJob::new();

    let report = importer.import(&mixed_records(), &job).await.unwrap();

    assert_eq!(report.total_batches, 3);
    assert!(!report.cancelled);

    let texts: Vec<(i64, String, TextSource)> = importer
        .store()
        .messages()
        .into_iter()
        .map(|m| (m.id, m.text, m.source))
        .collect();
    assert_eq!(
        texts,
        vec![
            (1, "plain text row".to_string(), TextSource::Verbatim),
            (2, "Pick up milk on the way home".to_string(), TextSource::Extracted),
            (3, "Running late, start without me".to_string(), TextSource::Extracted),
            (4, UNABLE_TO_PARSE_SENTINEL.to_string(), TextSource::UnableToParse),
            (5, ATTACHMENT_SENTINEL.to_string(), TextSource::Attachment),
            (6, REACTION_OR_SYSTEM_SENTINEL.to_string(), TextSource::ReactionOrSystem),
            (7, ATTACHMENT_SENTINEL.to_string(), TextSource::Attachment),
            (8, UNABLE_TO_PARSE_SENTINEL.to_string(), TextSource::UnableToParse),
        ]
    );

    assert_eq!(report.stats.verbatim, 1);
    assert_eq!(report.stats.extracted, 2);
    assert_eq!(report.stats.unable_to_parse, 2);
    assert_eq!(report.stats.attachment, 2);
    assert_eq!(report.stats.reaction_or_system, 1);
    assert_eq!(job.state().stats, Some(report.stats.clone()));
}

#[tokio::test]
async fn cancelled_import_keeps_completed_batches() {
    let job = Arc::new(ImportJob::new());
    let store = StoppingStore {
        inner: MemoryStore::new(),
        job: Arc::clone(&job),
        stop_after: 2,
        calls: AtomicUsize::new(0),
    };
    let importer = MessageImporter::new(store, MessageTextResolver::uncached()).with_batch_size(10);

    let records: Vec<RawMessageRecord> = (0..50)
        .map(|i| record(i, Some("hello again"), None, 0))
        .collect();
    let report = importer.import(&records, &job).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.batches_processed, 2);
    assert_eq!(report.total_batches, 5);
    assert_eq!(report.stats.total(), 20);
    assert_eq!(importer.store().inner.len(), 20);

    let state = job.state();
    assert_eq!(state.status, JobStatus::Cancelled);
    assert_eq!(state.progress.batches_completed, 2);
    assert_eq!(state.progress.messages_processed, 20);
}

#[tokio::test]
async fn stop_requested_before_import_runs_no_batches() {
    let job = ImportJob::new();
    job.cancel();

    let importer = MessageImporter::new(MemoryStore::new(), MessageTextResolver::uncached())
        .with_batch_size(2);
    let records: Vec<RawMessageRecord> = (0..4)
        .map(|i| record(i, Some("never stored"), None, 0))
        .collect();

    let report = importer.import(&records, &job).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.batches_processed, 0);
    assert_eq!(report.total_batches, 2);
    assert!(importer.store().is_empty());
    assert_eq!(job.status(), JobStatus::Cancelled);

    // The stop applied to that run only; the next one goes through.
    let report = importer.import(&records, &job).await.unwrap();
    assert!(!report.cancelled);
    assert_eq!(importer.store().len(), 4);
    assert_eq!(job.status(), JobStatus::Completed);
}

#[tokio::test]
async fn store_failure_fails_the_job() {
    let store = FlakyStore {
        ok_batches: 1,
        calls: AtomicUsize::new(0),
    };
    let importer = MessageImporter::new(store, MessageTextResolver::uncached()).with_batch_size(2);
    let job = ImportJob::new();
    let records: Vec<RawMessageRecord> = (0..6)
        .map(|i| record(i, Some("some text"), None, 0))
        .collect();

    let err = importer.import(&records, &job).await.unwrap_err();

    assert!(matches!(err, ImportError::Store(_)));
    assert_eq!(importer.store().calls.load(Ordering::SeqCst), 2);

    let state = job.state();
    assert_eq!(state.status, JobStatus::Failed);
    assert_eq!(state.progress.batches_completed, 1);
    assert!(state.error_message.unwrap().contains("database is locked"));
}

#[tokio::test]
async fn repeated_payloads_hit_the_extraction_cache() {
    let payload = StreamedPayloadBuilder::new()
        .string("Same forwarded joke again")
        .build();
    let records: Vec<RawMessageRecord> = (0..8)
        .map(|i| record(i, None, Some(payload.clone()), 0))
        .collect();

    let cache = Arc::new(ExtractionCache::new());
    let resolver = MessageTextResolver::new(Arc::clone(&cache));
    let importer = MessageImporter::new(MemoryStore::new(), resolver).with_batch_size(3);
    let job = ImportJob::new();

    let report = importer.import(&records, &job).await.unwrap();

    assert_eq!(report.stats.extracted, 8);
    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 7);
}
