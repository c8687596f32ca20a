//! `attributedBody` payload parsing.
//!
//! Message records carry their rich text as an opaque archive in one of two
//! historical encodings. This module recovers the human-readable text from
//! either one without ever failing loudly:
//!
//! - **`format`**: classifies a payload by its prefix
//! - **`metadata`**: denylist of archive bookkeeping strings shared by both readers
//! - **`object_graph`**: keyed binary archive (`bplist00`) reader
//! - **`streamed`**: legacy `streamtyped` reader
//! - **`sanitize`**: control-character cleanup applied to every candidate
//!
//! # Determinism
//!
//! Both readers collect every plausible string in payload order and return the
//! longest one, keeping the earliest on ties. The same bytes always yield the
//! same text, and a payload with no surviving candidate yields `None` rather
//! than a guess.

pub mod format;
pub mod metadata;
pub mod object_graph;
pub mod sanitize;
pub mod streamed;

pub use format::{FormatTag, detect_format};
pub use metadata::{accept_candidate, is_metadata};
pub use object_graph::extract_object_graph;
pub use sanitize::clean_text;
pub use streamed::extract_streamed;

/// A decoded string and where it came from in the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub offset: usize,
    pub len: usize,
}

/// Pick the longest candidate (in characters), keeping the first on ties.
pub(crate) fn select_longest(candidates: Vec<Candidate>) -> Option<Candidate> {
    let mut best: Option<(usize, Candidate)> = None;
    for candidate in candidates {
        let chars = candidate.text.chars().count();
        match &best {
            Some((best_chars, _)) if chars <= *best_chars => {}
            _ => best = Some((chars, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate)
}

/// Extract the message text from a payload of either encoding.
///
/// Returns the detected format alongside the text so callers can log which
/// reader ran.
pub fn extract_text(payload: &[u8]) -> (FormatTag, Option<String>) {
    let format = detect_format(payload);
    let text = match format {
        FormatTag::ObjectGraph => extract_object_graph(payload),
        FormatTag::StreamedObject => extract_streamed(payload),
        FormatTag::Unknown => None,
    };
    (format, text)
}
