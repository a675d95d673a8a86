//! Text utilities shared across rendering paths.

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncates a string with an ellipsis if it exceeds `max_width` terminal
/// columns. Width-aware, so CJK and emoji count as two columns.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        let next_width = truncated.width() + ch.width().unwrap_or(0);
        if next_width + 1 > max_width {
            break;
        }
        truncated.push(ch);
    }
    truncated.push('…');
    truncated
}

/// Strips ANSI escapes and expands tabs for display.
///
/// Tool output is arbitrary text; ANSI sequences would corrupt the frame
/// and tabs confuse width measurement (`unicode_width` treats control
/// characters as zero-width while terminals render them).
pub fn sanitize_for_display(s: &str) -> Cow<'_, str> {
    if s.contains('\x1b') || s.contains('\t') {
        Cow::Owned(s.replace('\x1b', "").replace('\t', "    "))
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
    }

    #[test]
    fn truncate_cuts_and_appends_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello w…");
        assert_eq!(truncate_with_ellipsis("hello", 1), "…");
    }

    #[test]
    fn truncate_counts_wide_characters() {
        // CJK characters occupy two columns each.
        assert_eq!(truncate_with_ellipsis("中文test", 6), "中文t…");
        assert_eq!(truncate_with_ellipsis("中文test", 8), "中文test");
    }

    #[test]
    fn sanitize_strips_escapes_and_tabs() {
        let result = sanitize_for_display("\x1b[31mred\x1b[0m\ttext");
        assert_eq!(result, "[31mred[0m    text");
    }

    #[test]
    fn sanitize_borrows_clean_input() {
        assert!(matches!(
            sanitize_for_display("clean text"),
            Cow::Borrowed(_)
        ));
    }
}
