//! Destination seam for resolved messages.
//!
//! The importer hands each resolved batch to a [`MessageStore`] from inside the
//! batch transform, so a store write is one of the run's suspension points.

use parking_lot::Mutex;
use std::future::Future;
use std::io::Write;

use crate::error::Result;
use crate::models::ImportedMessage;

/// Persists resolved messages into the application's message table.
pub trait MessageStore: Send + Sync {
    fn persist(&self, batch: &[ImportedMessage]) -> impl Future<Output = Result<()>> + Send;
}

/// Keeps imported messages in memory.
#[derive(Default)]
pub struct MemoryStore {
    messages: Mutex<Vec<ImportedMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<ImportedMessage> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl MessageStore for MemoryStore {
    async fn persist(&self, batch: &[ImportedMessage]) -> Result<()> {
        self.messages.lock().extend_from_slice(batch);
        Ok(())
    }
}

/// Writes each imported message as one JSON line.
pub struct JsonLinesStore<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesStore<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> MessageStore for JsonLinesStore<W> {
    async fn persist(&self, batch: &[ImportedMessage]) -> Result<()> {
        let mut writer = self.writer.lock();
        for message in batch {
            serde_json::to_writer(&mut *writer, message)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}
