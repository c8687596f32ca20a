//! Legacy `streamtyped` payload reader.
//!
//! The streamed encoding writes objects sequentially, each string introduced by
//! its class name followed by a fixed descriptor and a length:
//!
//! ```text
//! ... "NSString" | 01 94 84 01 2B | len | <len bytes of UTF-8>
//! ```
//!
//! The descriptor's second byte is `0x94` for immutable strings and `0x95` when
//! the string was archived from a mutable instance. The length is a single byte
//! below `0x80`, or `0x81` followed by a little-endian `u16`.
//!
//! Attributed strings built from several runs carry several string segments, so
//! every marker occurrence is read and the longest surviving segment wins.

use super::metadata::accept_candidate;
use super::{Candidate, select_longest};

const STRING_CLASS_MARKER: &[u8] = b"NSString";

const IMMUTABLE_PREAMBLE: [u8; 5] = [0x01, 0x94, 0x84, 0x01, 0x2b];
const MUTABLE_PREAMBLE: [u8; 5] = [0x01, 0x95, 0x84, 0x01, 0x2b];

const EXTENDED_LENGTH_ESCAPE: u8 = 0x81;

/// Which string descriptor introduced a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPreamble {
    Immutable,
    Mutable,
}

impl StringPreamble {
    pub const fn bytes(self) -> [u8; 5] {
        match self {
            StringPreamble::Immutable => IMMUTABLE_PREAMBLE,
            StringPreamble::Mutable => MUTABLE_PREAMBLE,
        }
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes == IMMUTABLE_PREAMBLE {
            Some(StringPreamble::Immutable)
        } else if bytes == MUTABLE_PREAMBLE {
            Some(StringPreamble::Mutable)
        } else {
            None
        }
    }
}

/// Extract the longest message-text segment from a streamed payload.
pub fn extract_streamed(payload: &[u8]) -> Option<String> {
    let mut candidates = Vec::new();
    let mut cursor = 0;

    while let Some(found) = find_marker(&payload[cursor..]) {
        let after_marker = cursor + found + STRING_CLASS_MARKER.len();
        if let Some(candidate) = read_segment(payload, after_marker) {
            candidates.push(candidate);
        }
        cursor = after_marker;
    }

    log::trace!(
        "streamed payload: {} bytes, {} candidate segments",
        payload.len(),
        candidates.len()
    );

    select_longest(candidates).map(|candidate| candidate.text)
}

fn find_marker(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(STRING_CLASS_MARKER.len())
        .position(|window| window == STRING_CLASS_MARKER)
}

/// Read one string segment starting right after a class marker.
///
/// Any bounds or descriptor mismatch drops this segment only.
fn read_segment(payload: &[u8], start: usize) -> Option<Candidate> {
    let descriptor = payload.get(start..start + IMMUTABLE_PREAMBLE.len())?;
    StringPreamble::from_bytes(descriptor)?;

    let length_at = start + IMMUTABLE_PREAMBLE.len();
    let (len, text_start) = read_length(payload, length_at)?;
    let bytes = payload.get(text_start..text_start.checked_add(len)?)?;

    let text = accept_candidate(&String::from_utf8_lossy(bytes))?;
    Some(Candidate {
        text,
        offset: text_start,
        len,
    })
}

fn read_length(payload: &[u8], at: usize) -> Option<(usize, usize)> {
    let first = *payload.get(at)?;
    if first < 0x80 {
        return Some((first as usize, at + 1));
    }
    if first != EXTENDED_LENGTH_ESCAPE {
        return None;
    }
    let extended = payload.get(at + 1..at + 3)?;
    let len = u16::from_le_bytes([extended[0], extended[1]]) as usize;
    Some((len, at + 3))
}
