use std::borrow::Cow;

/// Line break marker inserted in place of message newlines.
pub const LINE_BREAK: &str = "<br>";

/// Escapes the five markup-significant characters of user-supplied text.
///
/// Covers `&`, `<`, `>`, `"` and `'`, which is enough for both element
/// content and double- or single-quoted attribute values.
///
/// Returns `Cow::Borrowed` when nothing needs escaping.
///
/// # Examples
///
/// ```
/// use confide::util::escape_html;
///
/// assert_eq!(escape_html("a < b"), "a &lt; b");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| matches!(b, b'&' | b'<' | b'>' | b'"' | b'\'')) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Replaces newlines (`\n` or `\r\n`) with `<br>`.
///
/// Must only be applied to text that is already escaped; escaping the
/// result would turn the inserted markers into literal text.
pub fn nl2br(s: &str) -> Cow<'_, str> {
    if !s.contains('\n') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace("\r\n", "\n").replace('\n', LINE_BREAK))
}

/// Escapes a multi-line body and converts its newlines to line breaks.
pub fn multiline_html(s: &str) -> String {
    let escaped = escape_html(s);
    nl2br(&escaped).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unescape(s: &str) -> String {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#039;", "'")
            .replace("&amp;", "&")
    }

    #[test]
    fn test_escape_all_special_chars() {
        assert_eq!(
            escape_html(r#"<script>&"'"#),
            "&lt;script&gt;&amp;&quot;&#039;"
        );
    }

    #[test]
    fn test_clean_text_is_borrowed() {
        let result = escape_html("nothing to see here");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_already_escaped_text_is_escaped_again() {
        // Server text is never trusted to be pre-escaped
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_nl2br_simple() {
        assert_eq!(multiline_html("a\nb"), "a<br>b");
    }

    #[test]
    fn test_nl2br_crlf_is_one_break() {
        assert_eq!(multiline_html("a\r\nb"), "a<br>b");
    }

    #[test]
    fn test_multiline_escapes_each_line() {
        assert_eq!(multiline_html("<a>\n&b"), "&lt;a&gt;<br>&amp;b");
    }

    #[test]
    fn test_break_markers_survive() {
        let html = multiline_html("one\ntwo\nthree");
        assert_eq!(html.matches(LINE_BREAK).count(), 2);
        assert!(!html.contains("&lt;br&gt;"));
    }

    proptest! {
        #[test]
        fn prop_escape_round_trip(input in ".*") {
            let escaped = escape_html(&input);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
            prop_assert!(!escaped.contains('\''));
            prop_assert_eq!(unescape(&escaped), input);
        }

        #[test]
        fn prop_markup_input_never_leaks(prefix in "[a-z ]{0,10}", suffix in "[a-z ]{0,10}") {
            let input = format!("{prefix}<script>&\"'{suffix}");
            let escaped = escape_html(&input);
            let without_entities = escaped
                .replace("&amp;", "")
                .replace("&lt;", "")
                .replace("&gt;", "")
                .replace("&quot;", "")
                .replace("&#039;", "");
            prop_assert!(!without_entities
                .contains(|c: char| matches!(c, '<' | '>' | '&' | '"' | '\'')));
            prop_assert_eq!(unescape(&escaped), input);
        }
    }
}
