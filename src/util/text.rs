use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns (CJK and emoji count as two).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Fit `s` into `max_width` terminal columns, appending "..." when cut.
///
/// Widths of three columns or less have no room for an ellipsis, so the
/// result is just the characters that fit. Returns `Cow::Borrowed` when the
/// string already fits.
///
/// ```
/// use newsroom::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Markets rally", 20), "Markets rally");
/// assert_eq!(truncate_to_width("Markets rally on news", 10), "Markets...");
/// assert_eq!(truncate_to_width("News", 2), "Ne");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..end].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
    }
}

fn is_stripped_control(c: char) -> bool {
    c == '\x7f' || (c < '\x20' && !matches!(c, '\t' | '\n' | '\r'))
}

/// Remove terminal control characters and ANSI escape sequences.
///
/// Article text comes from third-party publishers and is printed straight to
/// the terminal, so CSI (`ESC [ ... final`) and OSC (`ESC ] ... BEL|ST`)
/// sequences, bare ESC, DEL and C0 controls are dropped. Tab, newline and
/// carriage return survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !is_stripped_control(c) {
                out.push(c);
            }
            continue;
        }

        match chars.peek() {
            Some('[') => {
                chars.next();
                // Parameter and intermediate bytes up to the final byte 0x40..=0x7e
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

/// Collapse all whitespace runs (including newlines) into single spaces.
///
/// Descriptions from the news service often carry line breaks that would
/// break one-line list output.
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fits_is_borrowed() {
        let result = truncate_to_width("Short", 10);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Testing", 4), "T...");
    }

    #[test]
    fn test_wide_chars_truncation() {
        // Each CJK char is two columns
        assert_eq!(truncate_to_width("日本語ニュース", 7), "日本...");
        assert_eq!(truncate_to_width("日本語", 3), "日");
        assert_eq!(truncate_to_width("日本語", 1), "");
    }

    #[test]
    fn test_narrow_widths_skip_ellipsis() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("News"), 4);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn test_strip_clean_text_is_borrowed() {
        let input = "Plain headline\twith tab\nand newline";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_c0_and_del() {
        assert_eq!(strip_control_chars("he\x00ll\x07o\x7f!"), "hello!");
    }

    #[test]
    fn test_strip_csi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mBreaking\x1b[0m"), "Breaking");
        assert_eq!(strip_control_chars("up\x1b[2Adown"), "updown");
    }

    #[test]
    fn test_strip_osc_sequences() {
        assert_eq!(strip_control_chars("\x1b]0;title\x07text"), "text");
        assert_eq!(strip_control_chars("\x1b]0;title\x1b\\text"), "text");
    }

    #[test]
    fn test_strip_bare_esc_and_unicode() {
        assert_eq!(strip_control_chars("a\x1bb"), "ab");
        assert_eq!(strip_control_chars("Nyheter \x1b[1mi dag\x1b[0m æøå"), "Nyheter i dag æøå");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("  one\n\ntwo\tthree  "), "one two three");
        assert_eq!(single_line(""), "");
    }

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_width(s in "[a-zA-Z0-9 .,日本語ニュース]{0,40}", width in 0usize..30) {
            let out = truncate_to_width(&s, width);
            prop_assert!(display_width(&out) <= width);
        }

        #[test]
        fn prop_stripped_text_has_no_escape(s in "\\PC{0,20}[\\x00-\\x1f\\x7f]{0,3}\\PC{0,20}") {
            let out = strip_control_chars(&s);
            prop_assert!(!out.contains('\x1b'));
            prop_assert!(!out.chars().any(is_stripped_control));
        }
    }
}
