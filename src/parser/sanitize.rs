//! Text cleanup for extracted and verbatim message text.

/// Strip control characters and surrounding whitespace.
///
/// Removes NUL and the C0/C1 control ranges, except the line and tab controls
/// `\n`, `\r` and `\t`, which carry message layout (CRLF text stays CRLF).
/// Every other code point is kept, including U+FFFD: a
/// replacement character marks an earlier decode failure and must reach the
/// caller.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_keeps_replacement_character() {
        assert_eq!(clean_text("a\u{FFFD}b"), "a\u{FFFD}b");
    }

    #[test]
    fn test_clean_removes_nul_and_controls() {
        assert_eq!(clean_text("hello\0world"), "helloworld");
        assert_eq!(clean_text("\u{1}\u{7f}bell\u{7}"), "bell");
        assert_eq!(clean_text("c1\u{85}\u{9f}x"), "c1x");
    }

    #[test]
    fn test_clean_trims_only_the_ends() {
        assert_eq!(clean_text("  test  "), "test");
        assert_eq!(clean_text("line one\nline two"), "line one\nline two");
        assert_eq!(clean_text(" a  b "), "a  b");
    }

    #[test]
    fn test_clean_preserves_unicode() {
        assert_eq!(clean_text("e\u{301}"), "e\u{301}");
        assert_eq!(clean_text("你好世界"), "你好世界");
        assert_eq!(clean_text("👍🏽 nice"), "👍🏽 nice");
        assert_eq!(clean_text("\u{FFFC}"), "\u{FFFC}");
    }

    #[test]
    fn test_clean_keeps_line_endings_and_tabs() {
        assert_eq!(clean_text("one\r\ntwo\tthree"), "one\r\ntwo\tthree");
        assert_eq!(clean_text("old mac\rline"), "old mac\rline");
    }

    #[test]
    fn test_clean_only_controls_is_empty() {
        assert_eq!(clean_text("\0\u{1}\u{2}"), "");
    }
}
