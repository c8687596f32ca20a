//! Chunked message import.
//!
//! This module drives a full message-history import without blocking the host:
//!
//! 1. **Batch Sizing** (`batch_size`) - Picks a batch size from the import length
//! 2. **Chunked Engine** (`chunked`) - Runs an async transform batch by batch, yielding in between
//! 3. **Job State** (`jobs`) - Progress, status and the "stop import" cancellation token
//! 4. **Storage** (`store`) - Destination seam for resolved messages
//! 5. **Coordination** (`coordinator`) - Resolves, persists and counts each batch
//! 6. **Statistics** (`stats`) - Per-outcome message counts
//!
//! # Scheduling
//!
//! Everything runs on the caller's task. Batches execute strictly in order and
//! the only suspension points are the yield after each batch and whatever the
//! store awaits. Cancellation is observed between batches only, so a batch that
//! has started always finishes.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use message_import::import::{ImportJob, MemoryStore, MessageImporter};
//! use message_import::resolver::MessageTextResolver;
//!
//! let importer = MessageImporter::new(MemoryStore::new(), MessageTextResolver::uncached());
//! let job = ImportJob::new();
//!
//! let report = importer.import(&records, &job).await?;
//! println!("imported {} messages", report.stats.total());
//! ```

pub mod batch_size;
pub mod chunked;
pub mod coordinator;
pub mod jobs;
pub mod source;
pub mod stats;
pub mod store;

// Re-export main types
pub use batch_size::batch_size_for;
pub use chunked::{ChunkOptions, ChunkResult, run_chunks};
pub use coordinator::{ImportReport, MessageImporter};
pub use jobs::{ImportJob, JobStatus};
pub use source::{RecordSet, read_records};
pub use stats::ImportStats;
pub use store::{JsonLinesStore, MemoryStore, MessageStore};
