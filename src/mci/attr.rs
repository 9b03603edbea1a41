//! Pipe-colour strings to DOS attribute bytes.
//!
//! `|00`..`|15` set the foreground nibble, `|16`..`|23` the background bits
//! and `|24`..`|31` the background plus the blink bit. Everything else in the
//! string is ignored.

use super::theme::Theme;

fn two_digits(a: u8, b: u8) -> Option<u8> {
    if a.is_ascii_digit() && b.is_ascii_digit() {
        Some((a - b'0') * 10 + (b - b'0'))
    } else {
        None
    }
}

/// Applies one numeric colour code to `attr`. Codes above 31 leave it alone.
pub fn apply_code(attr: u8, code: u8) -> u8 {
    match code {
        0..=15 => (attr & 0xf0) | code,
        16..=23 => (attr & 0x8f) | ((code - 16) << 4),
        24..=31 => (attr & 0x0f) | ((code - 24) << 4) | 0x80,
        _ => attr,
    }
}

/// Folds every `|##` code of `s` into `base`.
pub fn pipe_attr(s: &str, base: u8) -> u8 {
    themed_attr(s, base, None)
}

/// Like [`pipe_attr`] but `|xx` codes are resolved through `theme` first.
pub fn themed_attr(s: &str, base: u8, theme: Option<&Theme>) -> u8 {
    let b = s.as_bytes();
    let mut attr = base;
    let mut i = 0;
    while i < b.len() {
        if b[i] != b'|' || i + 2 >= b.len() {
            i += 1;
            continue;
        }
        if let Some(code) = two_digits(b[i + 1], b[i + 2]) {
            attr = apply_code(attr, code);
            i += 3;
            continue;
        }
        if let Some(theme) = theme {
            if b[i + 1].is_ascii_lowercase() && b[i + 2].is_ascii_lowercase() {
                if let Some(expansion) = theme.lookup(b[i + 1] as char, b[i + 2] as char) {
                    // theme values never hold |xx, so this recurses once
                    attr = themed_attr(expansion, attr, None);
                    i += 3;
                    continue;
                }
            }
        }
        i += 1;
    }
    attr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_codes() {
        assert_eq!(pipe_attr("|14", 0x07), 0x0e);
        assert_eq!(pipe_attr("|14|17", 0x00), 0x1e);
        assert_eq!(pipe_attr("|15|28", 0x00), 0xcf);
        // background-only keeps fg and blink
        assert_eq!(pipe_attr("|18", 0x8f), 0xaf);
        assert_eq!(pipe_attr("|99 text |", 0x42), 0x42);
    }

    #[test]
    fn test_theme_codes() {
        let theme = Theme::default();
        assert_eq!(themed_attr("|pr", 0x00, Some(&theme)), 0x0e);
        assert_eq!(themed_attr("|cd", 0x4f, Some(&theme)), 0x07);
        assert_eq!(themed_attr("|pr", 0x00, None), 0x00);
        assert_eq!(themed_attr("|zz|02", 0x00, Some(&theme)), 0x02);
    }
}
