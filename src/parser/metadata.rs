//! Recognition of serialization bookkeeping tokens.
//!
//! Both extractors pull every string out of a payload, and most of those strings
//! are class names and attribute keys rather than message text. This filter is
//! the shared denylist.
//!
//! The families are matched differently:
//!
//! - archiver root markers: exact or prefix match
//! - object-system class names: substring match, so user text embedding one of
//!   them is filtered too
//! - iMessage attribute keys (`__kIM…` and `kIM…`): prefix match only, so
//!   "I love making kIMchi at home" survives
//! - streamed-format and property-accessor markers: substring match

use super::sanitize::clean_text;

/// Shortest cleaned string still considered message text.
pub const MIN_CANDIDATE_CHARS: usize = 3;

const ARCHIVER_TOKENS: &[&str] = &[
    "$null",
    "$archiver",
    "$objects",
    "$top",
    "$version",
    "$class",
    "NSKeyedArchiver",
];

const CLASS_NAME_TOKENS: &[&str] = &[
    "NSAttributedString",
    "NSMutableAttributedString",
    "NSString",
    "NSMutableString",
    "NSObject",
    "NSDictionary",
    "NSMutableDictionary",
    "NSArray",
    "NSMutableArray",
    "NSData",
    "NSMutableData",
    "NSNumber",
    "NSValue",
];

const IMESSAGE_KEY_PREFIXES: &[&str] = &["__kIM", "kIM"];

const MARKER_TOKENS: &[&str] = &[
    "streamtyped",
    "NS.string",
    "NS.objects",
    "NS.keys",
    "NS.bytes",
    "NS.rangeval",
];

/// Returns true when `token` is serialization metadata rather than user text.
pub fn is_metadata(token: &str) -> bool {
    let token = token.trim();

    ARCHIVER_TOKENS
        .iter()
        .any(|marker| token == *marker || token.starts_with(marker))
        || CLASS_NAME_TOKENS.iter().any(|name| token.contains(name))
        || IMESSAGE_KEY_PREFIXES
            .iter()
            .any(|prefix| token.starts_with(prefix))
        || MARKER_TOKENS.iter().any(|marker| token.contains(marker))
}

/// Clean a raw extracted string and keep it only if it can be message text.
///
/// Returns `None` for metadata tokens and for anything shorter than
/// [`MIN_CANDIDATE_CHARS`] after cleaning.
pub fn accept_candidate(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.chars().count() < MIN_CANDIDATE_CHARS || is_metadata(&cleaned) {
        return None;
    }
    Some(cleaned)
}
