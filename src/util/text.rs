use std::borrow::Cow;

/// Marker appended to text cut short by [`truncate_chars`].
const ELLIPSIS: &str = "...";

/// Truncates a string to at most `max_chars` characters, appending `...`
/// when anything was cut.
///
/// Counts Unicode scalar values, not bytes, so multi-byte text is never
/// split mid-character. Text that fits is returned borrowed.
///
/// # Examples
///
/// ```
/// use confide::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 5), "Hello...");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    let prefix = char_prefix(s, max_chars);
    if prefix.len() == s.len() {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("{prefix}{ELLIPSIS}"))
    }
}

/// The first `max_chars` characters of `s`, or all of it if shorter.
pub fn char_prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((cut, _)) => &s[..cut],
    }
}

fn is_stripped_control(c: char) -> bool {
    (c.is_control() && c != '\t' && c != '\n' && c != '\r') || c == '\u{7f}'
}

/// Strips terminal control characters and ANSI escape sequences.
///
/// Post text comes from other users and is printed straight to the
/// terminal by the `show` command, so CSI (`ESC [ ... final`) and OSC
/// (`ESC ] ... BEL` or `ESC ] ... ESC \`) sequences are dropped along with
/// bare C0/C1 controls. Tab, newline and carriage return are kept.
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
                // Parameter bytes run until a final byte in 0x40..=0x7e
                for next in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&next) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(next) = chars.next() {
                    if next == '\x07' {
                        break;
                    }
                    if next == '\x1b' && chars.peek() == Some(&'\\') {
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
