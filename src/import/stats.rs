//! Import statistics tracking.
//!
//! Tracks how each imported message's display text was resolved.

use crate::models::TextSource;
use serde::{Deserialize, Serialize};

/// Per-outcome message counts for an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    /// Messages displayed from their verbatim text field
    pub verbatim: usize,
    /// Messages displayed from text recovered out of the payload
    pub extracted: usize,
    /// Attachment-only messages
    pub attachment: usize,
    /// Reactions and system rows
    pub reaction_or_system: usize,
    /// Messages whose payload yielded no text
    pub unable_to_parse: usize,
}

impl ImportStats {
    pub fn record(&mut self, source: TextSource) {
        match source {
            TextSource::Verbatim => self.verbatim += 1,
            TextSource::Extracted => self.extracted += 1,
            TextSource::Attachment => self.attachment += 1,
            TextSource::ReactionOrSystem => self.reaction_or_system += 1,
            TextSource::UnableToParse => self.unable_to_parse += 1,
        }
    }

    /// Merge another ImportStats into this one by summing all counts.
    pub fn merge(&mut self, other: ImportStats) {
        self.verbatim += other.verbatim;
        self.extracted += other.extracted;
        self.attachment += other.attachment;
        self.reaction_or_system += other.reaction_or_system;
        self.unable_to_parse += other.unable_to_parse;
    }

    pub fn total(&self) -> usize {
        self.verbatim
            + self.extracted
            + self.attachment
            + self.reaction_or_system
            + self.unable_to_parse
    }
}

impl FromIterator<TextSource> for ImportStats {
    fn from_iter<I: IntoIterator<Item = TextSource>>(iter: I) -> Self {
        let mut stats = ImportStats::default();
        for source in iter {
            stats.record(source);
        }
        stats
    }
}
