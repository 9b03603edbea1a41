//! Log-safe rendering of legacy text.
//!
//! CTL files and language strings routinely carry AVATAR/ANSI control bytes
//! and DOS line endings, and `protocol.max` strings are NUL-padded Latin-1;
//! log lines must stay single-line and printable.

use std::fmt::Write;

/// Longest preview of one untrusted value.
const MAX_PREVIEW: usize = 160;

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() => {
            let _ = write!(out, "\\x{:02X}", c as u32);
        }
        c => out.push(c),
    }
}

fn escape_chars(chars: impl Iterator<Item = char>, hint: usize) -> String {
    let mut out = String::with_capacity(hint.min(MAX_PREVIEW) + 8);
    for (count, ch) in chars.enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        push_escaped(&mut out, ch);
    }
    out
}

/// Escapes one CTL line or string value for a log line. The line terminator
/// the value was read with (`\r\n` or `\n`) is not part of the value and is
/// dropped; any other CR, LF, TAB or backslash uses its C escape, remaining
/// control characters become `\xNN`, and the preview is capped with `…`.
pub fn escape_log(s: &str) -> String {
    let s = s
        .strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s);
    escape_chars(s.chars(), s.len())
}

/// Escapes a fixed-width field out of a binary record: bytes are Latin-1 and
/// the NUL padding after the last significant byte is dropped.
pub fn escape_log_bytes(b: &[u8]) -> String {
    let end = b.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
    escape_chars(b[..end].iter().map(|&c| char::from(c)), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_and_truncates() {
        assert_eq!(escape_log("Line1\nLine2\r\tEnd"), "Line1\\nLine2\\r\\tEnd");
        let long = "x".repeat(MAX_PREVIEW + 10);
        let esc = escape_log(&long);
        assert!(esc.ends_with('…'));
        assert_eq!(esc.chars().count(), MAX_PREVIEW + 1);
    }

    #[test]
    fn test_dos_line_ending_dropped() {
        assert_eq!(escape_log("Name Night Owl\r\n"), "Name Night Owl");
        assert_eq!(escape_log("Task 1\n"), "Task 1");
        assert_eq!(escape_log("half\r"), "half\\r");
    }

    #[test]
    fn test_avatar_bytes_are_hex() {
        assert_eq!(escape_log("\u{16}\u{1}\u{e}Hi"), "\\x16\\x01\\x0EHi");
        assert_eq!(escape_log("C:\\MAX"), "C:\\\\MAX");
    }

    #[test]
    fn test_bytes_drop_nul_padding() {
        assert_eq!(escape_log_bytes(b"Zmodem\0\0\0"), "Zmodem");
        assert_eq!(escape_log_bytes(b"\xe9t\xe9\0"), "été");
        assert_eq!(escape_log_bytes(b"\0\0"), "");
        assert_eq!(escape_log_bytes(b"a\0b\0"), "a\\x00b");
    }
}
