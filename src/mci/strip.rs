use super::StripFlags;

fn two_digits(a: char, b: char) -> Option<u32> {
    Some(a.to_digit(10)? * 10 + b.to_digit(10)?)
}

/// Length of the code of a class in `flags` starting at `s[i]`, if any.
fn code_len(s: &[char], i: usize, flags: StripFlags) -> Option<usize> {
    let at = |k: usize| s.get(k).copied().unwrap_or('\0');
    let (c, a, b) = (at(i), at(i + 1), at(i + 2));

    if c == '|' {
        if flags.contains(StripFlags::COLORS) {
            let numeric = matches!(two_digits(a, b), Some(0..=31));
            let themed = a.is_ascii_lowercase() && b.is_ascii_lowercase();
            if numeric || themed {
                return Some(3);
            }
        }
        if a == 'P' && b == 'D' && flags.contains(StripFlags::FORMAT) {
            return Some(3);
        }
        if flags.contains(StripFlags::INFO) {
            let code = (a.is_ascii_uppercase() && b.is_ascii_uppercase()) || (a == 'U' && b == '#');
            let cpr = a == '&' && b == '&';
            let param = a == '!' && matches!(b, '1'..='9' | 'A'..='F');
            if code || cpr || param {
                return Some(3);
            }
        }
    }

    if c == '[' && flags.contains(StripFlags::INFO) {
        if matches!(a, '0' | '1' | 'K') {
            return Some(2);
        }
        if matches!(a, 'A' | 'B' | 'C' | 'D' | 'L' | 'X' | 'Y') && two_digits(b, at(i + 3)).is_some() {
            return Some(4);
        }
    }

    if c == '$' && flags.contains(StripFlags::FORMAT) && two_digits(b, at(i + 3)).is_some() {
        if matches!(a, 'C' | 'L' | 'R' | 'T') {
            return Some(4);
        }
        if matches!(a, 'c' | 'l' | 'r' | 'D' | 'X') && i + 4 < s.len() {
            return Some(5);
        }
    }
    None
}

/// Removes the token classes in `flags` from `src`. `||` collapses to a
/// single literal `|`. Codes that only appear once their neighbours are gone
/// are removed too (`a||14b` gives `a|b`, `[$L10K` gives nothing), so the
/// result never carries a code of a stripped class.
pub fn strip(src: &str, flags: StripFlags) -> String {
    let s: Vec<char> = src.chars().collect();
    let mut out = Vec::with_capacity(s.len());
    let mut i = 0;

    while i < s.len() {
        if s[i] == '|' && s.get(i + 1) == Some(&'|') {
            out.push('|');
            i += 2;
            continue;
        }
        if let Some(n) = code_len(&s, i, flags) {
            i += n;
            continue;
        }
        out.push(s[i]);
        i += 1;
    }

    // every `|` left is literal now: keep it and drop what follows
    loop {
        let hit = (0..out.len()).find_map(|k| code_len(&out, k, flags).map(|n| (k, n)));
        let Some((k, n)) = hit else { break };
        let from = if out[k] == '|' { k + 1 } else { k };
        out.drain(from..(k + n).min(out.len()));
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_colours() {
        assert_eq!(strip("|14Hi |prthere||x", StripFlags::COLORS), "Hi there|x");
        assert_eq!(strip("|45 stays", StripFlags::COLORS), "|45 stays");
    }

    #[test]
    fn test_strip_info() {
        assert_eq!(
            strip("|UN|U#|&&|!3[X10[K|!G!", StripFlags::INFO),
            "|!G!"
        );
        assert_eq!(strip("|14|UN", StripFlags::INFO), "|14");
    }

    #[test]
    fn test_strip_format() {
        assert_eq!(strip("$L20|PD$c10*$D05=$X40 $T03end$", StripFlags::FORMAT), "end$");
        assert_eq!(strip("$$5", StripFlags::FORMAT), "$$5");
    }

    #[test]
    fn test_strip_everything() {
        assert_eq!(strip("|15Hello, |UN! |07$R10|BN", StripFlags::all()), "Hello, ! ");
    }

    #[test]
    fn test_collapsed_bar_cannot_start_a_code() {
        assert_eq!(strip("a||14b", StripFlags::all()), "a|b");
        assert_eq!(strip("a||UNb", StripFlags::INFO), "a|b");
        assert_eq!(strip("[$L10K", StripFlags::all()), "");
        assert_eq!(strip("|$L1014x", StripFlags::all()), "|x");
        // a class that is not stripped survives behind the bar
        assert_eq!(strip("a||14b", StripFlags::INFO), "a|14b");
        assert_eq!(strip("pipe || here", StripFlags::all()), "pipe | here");
    }
}
