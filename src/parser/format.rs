//! Payload format detection.
//!
//! Classifies an `attributedBody` payload by looking at a bounded prefix window.

/// Magic prefix of the binary object-graph (keyed archive) encoding.
pub const OBJECT_GRAPH_MAGIC: &[u8; 8] = b"bplist00";

/// Textual marker of the legacy streamed-object encoding.
pub const STREAMED_MARKER: &[u8] = b"streamtyped";

/// The streamed marker only counts when it ends inside this many leading bytes.
pub const STREAMED_MARKER_WINDOW: usize = 50;

/// Encoding of a raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    ObjectGraph,
    StreamedObject,
    Unknown,
}

/// Detect the encoding of a payload.
///
/// The object-graph magic wins over the streamed marker, since an object-graph
/// archive may carry the word `streamtyped` as ordinary string content.
pub fn detect_format(payload: &[u8]) -> FormatTag {
    if payload.starts_with(OBJECT_GRAPH_MAGIC) {
        return FormatTag::ObjectGraph;
    }

    let window = &payload[..payload.len().min(STREAMED_MARKER_WINDOW)];
    if window
        .windows(STREAMED_MARKER.len())
        .any(|candidate| candidate == STREAMED_MARKER)
    {
        return FormatTag::StreamedObject;
    }

    FormatTag::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_object_graph() {
        let mut data = OBJECT_GRAPH_MAGIC.to_vec();
        data.extend_from_slice(&[0xd1, 0x01, 0x02]);
        assert_eq!(detect_format(&data), FormatTag::ObjectGraph);
    }

    #[test]
    fn test_detect_streamed_with_version_preamble() {
        let data = b"\x04\x0bstreamtyped\x81\xe8\x03\x84\x01@";
        assert_eq!(detect_format(data), FormatTag::StreamedObject);
    }

    #[test]
    fn test_detect_streamed_without_preamble() {
        assert_eq!(detect_format(b"streamtyped"), FormatTag::StreamedObject);
    }

    #[test]
    fn test_detect_marker_past_window_is_unknown() {
        let mut data = vec![0u8; STREAMED_MARKER_WINDOW];
        data.extend_from_slice(STREAMED_MARKER);
        assert_eq!(detect_format(&data), FormatTag::Unknown);
    }

    #[test]
    fn test_detect_marker_straddling_window_is_unknown() {
        let mut data = vec![0u8; STREAMED_MARKER_WINDOW - 5];
        data.extend_from_slice(STREAMED_MARKER);
        assert_eq!(detect_format(&data), FormatTag::Unknown);
    }

    #[test]
    fn test_object_graph_takes_priority() {
        let mut data = OBJECT_GRAPH_MAGIC.to_vec();
        data.extend_from_slice(b"streamtyped");
        assert_eq!(detect_format(&data), FormatTag::ObjectGraph);
    }

    #[test]
    fn test_detect_empty_and_short() {
        assert_eq!(detect_format(&[]), FormatTag::Unknown);
        assert_eq!(detect_format(b"bplist0"), FormatTag::Unknown);
        assert_eq!(detect_format(b"stream"), FormatTag::Unknown);
    }

    #[test]
    fn test_detect_plain_text() {
        assert_eq!(detect_format(b"Just plain text data"), FormatTag::Unknown);
    }
}
