//! Message text resolution.
//!
//! Decides what a single message row displays. The first rule that applies wins:
//!
//! 1. a non-empty verbatim `text` field (after cleaning)
//! 2. text extracted from the `attributedBody` payload, or the unable-to-parse
//!    sentinel when the payload yields nothing
//! 3. the attachment sentinel when the row has attachments
//! 4. the reaction/system sentinel
//!
//! Resolution is total: malformed payloads degrade to a sentinel and never
//! panic or error.

pub mod cache;

pub use cache::{ExtractionCache, ExtractionCacheStats};

use crate::models::{RawMessageRecord, ResolvedMessageText};
use crate::parser::{clean_text, extract_text};
use std::sync::Arc;

/// Resolve a record's display text without caching.
pub fn resolve_message_text(record: &RawMessageRecord) -> ResolvedMessageText {
    MessageTextResolver::uncached().resolve(record)
}

/// Resolver with an optional, explicitly supplied extraction cache.
#[derive(Clone, Default)]
pub struct MessageTextResolver {
    cache: Option<Arc<ExtractionCache>>,
}

impl MessageTextResolver {
    pub fn new(cache: Arc<ExtractionCache>) -> Self {
        Self { cache: Some(cache) }
    }

    pub fn uncached() -> Self {
        Self { cache: None }
    }

    pub fn cache(&self) -> Option<&ExtractionCache> {
        self.cache.as_deref()
    }

    pub fn resolve(&self, record: &RawMessageRecord) -> ResolvedMessageText {
        if let Some(text) = record.text.as_deref() {
            let cleaned = clean_text(text);
            if !cleaned.is_empty() {
                return ResolvedMessageText::Verbatim(cleaned);
            }
        }

        if let Some(payload) = record.attributed_body.as_deref() {
            return match self.extract(payload) {
                Some(text) => ResolvedMessageText::Extracted(text),
                None => {
                    log::trace!("message {}: payload yielded no text", record.id);
                    ResolvedMessageText::UnableToParse
                }
            };
        }

        if record.attachment_count > 0 {
            ResolvedMessageText::Attachment
        } else {
            ResolvedMessageText::ReactionOrSystem
        }
    }

    fn extract(&self, payload: &[u8]) -> Option<String> {
        match &self.cache {
            Some(cache) => cache.get_or_extract(payload, extract_payload_text),
            None => extract_payload_text(payload),
        }
    }
}

fn extract_payload_text(payload: &[u8]) -> Option<String> {
    let (format, text) = extract_text(payload);
    let cleaned = text
        .map(|text| clean_text(&text))
        .filter(|text| !text.is_empty());
    log::trace!(
        "payload of {} bytes detected as {:?}, text recovered: {}",
        payload.len(),
        format,
        cleaned.is_some()
    );
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{KeyedArchiveBuilder, StreamedPayloadBuilder};

    fn record(
        text: Option<&str>,
        payload: Option<Vec<u8>>,
        attachment_count: u32,
    ) -> RawMessageRecord {
        RawMessageRecord {
            id: 1,
            text: text.map(str::to_string),
            attributed_body: payload,
            attachment_count,
        }
    }

    fn archive(text: &str) -> Vec<u8> {
        let mut archive = KeyedArchiveBuilder::new();
        archive.push_string_object(text);
        archive.push_string("__kIMMessagePartAttributeName");
        archive.build()
    }

    #[test]
    fn test_verbatim_text_wins() {
        let resolved = resolve_message_text(&record(
            Some("  from text column "),
            Some(archive("from payload")),
            2,
        ));
        assert_eq!(
            resolved,
            ResolvedMessageText::Verbatim("from text column".to_string())
        );
    }

    #[test]
    fn test_blank_text_falls_through_to_payload() {
        let payload = archive("from payload");
        let resolved = resolve_message_text(&record(Some(" \0 "), Some(payload), 0));
        assert_eq!(
            resolved,
            ResolvedMessageText::Extracted("from payload".to_string())
        );
    }

    #[test]
    fn test_streamed_payload_is_extracted() {
        let payload = StreamedPayloadBuilder::new().string("legacy body").build();
        let resolved = resolve_message_text(&record(None, Some(payload), 0));
        assert_eq!(
            resolved,
            ResolvedMessageText::Extracted("legacy body".to_string())
        );
    }

    #[test]
    fn test_unparseable_payload_wins_over_attachments() {
        let resolved = resolve_message_text(&record(None, Some(b"garbage bytes".to_vec()), 3));
        assert_eq!(resolved, ResolvedMessageText::UnableToParse);
    }

    #[test]
    fn test_metadata_only_payload_is_unable_to_parse() {
        let mut archive = KeyedArchiveBuilder::new();
        archive.push_class("NSMutableAttributedString");
        let resolved = resolve_message_text(&record(None, Some(archive.build()), 0));
        assert_eq!(resolved, ResolvedMessageText::UnableToParse);
    }

    #[test]
    fn test_attachment_fallback() {
        let resolved = resolve_message_text(&record(None, None, 1));
        assert_eq!(resolved, ResolvedMessageText::Attachment);
    }

    #[test]
    fn test_empty_payload_is_unable_to_parse() {
        for attachments in [0, 1] {
            let resolved = resolve_message_text(&record(None, Some(Vec::new()), attachments));
            assert_eq!(resolved, ResolvedMessageText::UnableToParse);
        }
    }

    #[test]
    fn test_reaction_or_system_fallback() {
        let resolved = resolve_message_text(&record(None, None, 0));
        assert_eq!(resolved, ResolvedMessageText::ReactionOrSystem);
        assert_eq!(resolved.as_str(), crate::models::REACTION_OR_SYSTEM_SENTINEL);
    }

    #[test]
    fn test_cached_resolver_reuses_extraction() {
        let cache = Arc::new(ExtractionCache::new());
        let resolver = MessageTextResolver::new(Arc::clone(&cache));
        let payload = archive("cached body");

        for _ in 0..3 {
            let resolved = resolver.resolve(&record(None, Some(payload.clone()), 0));
            assert_eq!(
                resolved,
                ResolvedMessageText::Extracted("cached body".to_string())
            );
        }

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }
}
