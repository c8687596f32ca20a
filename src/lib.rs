//! Message history import core.
//!
//! Recovers display text from message rows exported by a phone backup or a
//! desktop message store, and imports large histories in cancellable batches.
//!
//! - [`parser`]: format detection and text extraction for `attributedBody` payloads
//! - [`resolver`]: per-message display text policy and the extraction cache
//! - [`import`]: chunked processing engine, batch sizing, job state and storage seam

pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod parser;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::ImportConfig;
pub use error::{ImportError, Result};
pub use models::{ImportedMessage, RawMessageRecord, ResolvedMessageText, TextSource};
pub use resolver::{MessageTextResolver, resolve_message_text};
