use super::{InfoCode, Param, ParseFlags, TemplateContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Justify {
    Left,
    Right,
    Center,
}

/// Operators waiting for the next information code.
#[derive(Debug)]
struct Pending {
    space: bool,
    justify: Option<(Justify, usize, char)>,
    trim: Option<usize>,
}

fn two_digits(a: char, b: char) -> Option<usize> {
    Some(a.to_digit(10)? as usize * 10 + b.to_digit(10)? as usize)
}

fn param_index(c: char) -> Option<usize> {
    match c {
        '1'..='9' => Some(c as usize - '1' as usize),
        'A'..='F' => Some(c as usize - 'A' as usize + 9),
        _ => None,
    }
}

fn is_cursor_motion(c: char) -> bool {
    matches!(c, 'A' | 'B' | 'C' | 'D' | 'L' | 'X' | 'Y')
}

/// Replaces `|!N` (with an optional `c`/`d`/`l`/`u` hint) by its parameter.
/// Unbound positions expand to nothing.
fn substitute_params(src: &str, params: &[Param]) -> String {
    let s: Vec<char> = src.chars().collect();
    let at = |i: usize| s.get(i).copied().unwrap_or('\0');
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < s.len() {
        if s[i] == '|' && at(i + 1) == '|' {
            out.push_str("||");
            i += 2;
            continue;
        }
        if s[i] == '|' && at(i + 1) == '!' {
            if let Some(idx) = param_index(at(i + 2)) {
                let mut next = i + 3;
                let hint = match at(next) {
                    c @ ('c' | 'd' | 'l' | 'u') => {
                        next += 1;
                        Some(c)
                    }
                    _ => None,
                };
                if let Some(p) = params.get(idx) {
                    out.push_str(&p.render(hint));
                }
                i = next;
                continue;
            }
        }
        out.push(s[i]);
        i += 1;
    }
    out
}

/// Printable width of `s`: colour codes, info codes, `|!N` and cursor codes
/// count zero, `||` counts one.
pub fn visible_len(s: &str) -> usize {
    let s: Vec<char> = s.chars().collect();
    let at = |i: usize| s.get(i).copied().unwrap_or('\0');
    let mut count = 0;
    let mut i = 0;
    while i < s.len() {
        let c = s[i];
        if c == '\x16' {
            if i + 2 < s.len() {
                i += 3;
                continue;
            }
            break;
        }
        if c == '|' {
            let (a, b) = (at(i + 1), at(i + 2));
            if matches!(two_digits(a, b), Some(0..=31))
                || (a == 'U' && b == '#')
                || (a.is_ascii_uppercase() && b.is_ascii_uppercase())
                || (a == '!' && param_index(b).is_some())
            {
                i += 3;
                continue;
            }
            if a == '|' {
                count += 1;
                i += 2;
                continue;
            }
        }
        if c == '[' {
            let cc = at(i + 1);
            if matches!(cc, '0' | '1' | 'K') {
                i += 2;
                continue;
            }
            if is_cursor_motion(cc) && two_digits(at(i + 2), at(i + 3)).is_some() {
                i += 4;
                continue;
            }
        }
        count += 1;
        i += 1;
    }
    count
}

/// Cuts `s` after `width` visible characters, keeping leading colour codes.
fn trim_visible(s: &str, width: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    let at = |i: usize| chars.get(i).copied().unwrap_or('\0');
    let mut out = String::with_capacity(s.len());
    let mut visible = 0;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\x16' {
            if i + 2 >= chars.len() {
                break;
            }
            out.extend(&chars[i..i + 3]);
            i += 3;
            continue;
        }
        if c == '|' && matches!(two_digits(at(i + 1), at(i + 2)), Some(0..=31)) {
            out.extend(&chars[i..i + 3]);
            i += 3;
            continue;
        }
        if visible >= width {
            break;
        }
        if c == '|' && at(i + 1) == '|' {
            out.push_str("||");
            i += 2;
        } else {
            out.push(c);
            i += 1;
        }
        visible += 1;
    }
    out
}

fn control_code(a: char, b: char) -> Option<&'static str> {
    Some(match (a, b) {
        ('C', 'L') => "\x0c",
        ('B', 'S') => "\x08 \x08",
        ('C', 'R') => "\r\n",
        ('C', 'D') => "\x1b[0m",
        ('S', 'A') => "\x1b7",
        ('R', 'A') => "\x1b8",
        ('S', 'S') => "\x1b[?47h",
        ('R', 'S') => "\x1b[?47l",
        ('L', 'C') | ('L', 'F') => "",
        _ => return None,
    })
}

impl TemplateContext<'_> {
    fn info_value(&self, a: char, b: char) -> Option<String> {
        let code = InfoCode::from_pair(a, b)?;
        let info = self.info?;
        let value = match code {
            InfoCode::Date => info.now().format("%d %b %y").to_string(),
            InfoCode::Time => info.now().format("%H:%M").to_string(),
            InfoCode::TimeSeconds => info.now().format("%H:%M:%S").to_string(),
            _ => info.text(code)?,
        };
        Some(value).filter(|v| !v.is_empty())
    }

    /// Expands `src` under the current flags, theme and information source.
    ///
    /// Positional parameters are substituted before anything else, so a
    /// parameter value can feed a format operator. The context column is left
    /// where the output ends.
    pub fn expand(&mut self, src: &str, params: &[Param]) -> String {
        let flags = self.flags;
        let text = if flags.contains(ParseFlags::MCI_CODES) {
            substitute_params(src, params)
        } else {
            src.to_string()
        };
        let s: Vec<char> = text.chars().collect();
        let at = |i: usize| s.get(i).copied().unwrap_or('\0');

        let mut out = String::with_capacity(text.len());
        let mut col = self.column as usize;
        let mut pending = Pending {
            space: false,
            justify: None,
            trim: None,
        };
        let mut i = 0;

        while i < s.len() {
            let c = s[i];

            if c == '|' && at(i + 1) == '|' {
                out.push_str("||");
                col += 1;
                i += 2;
                continue;
            }
            if c == '$' && at(i + 1) == '$' {
                out.push('$');
                col += 1;
                i += 2;
                continue;
            }

            if c == '$' && flags.contains(ParseFlags::FORMAT_OPS) {
                let op = at(i + 1);
                let ch = at(i + 4);
                if let Some(n) = two_digits(at(i + 2), at(i + 3)) {
                    match op {
                        'L' | 'R' | 'C' | 'l' | 'r' | 'c' => {
                            let justify = match op.to_ascii_uppercase() {
                                'L' => Justify::Left,
                                'R' => Justify::Right,
                                _ => Justify::Center,
                            };
                            if op.is_ascii_uppercase() {
                                pending.justify = Some((justify, n, ' '));
                                i += 4;
                                continue;
                            }
                            if ch != '\0' {
                                pending.justify = Some((justify, n, ch));
                                i += 5;
                                continue;
                            }
                        }
                        'T' => {
                            pending.trim = Some(n);
                            i += 4;
                            continue;
                        }
                        'D' if ch != '\0' => {
                            out.extend(std::iter::repeat(ch).take(n));
                            col += n;
                            i += 5;
                            continue;
                        }
                        'X' if ch != '\0' => {
                            if n > col {
                                out.extend(std::iter::repeat(ch).take(n - col));
                                col = n;
                            }
                            i += 5;
                            continue;
                        }
                        _ => {}
                    }
                }
            }

            if flags.contains(ParseFlags::FORMAT_OPS) && c == '|' && at(i + 1) == 'P' && at(i + 2) == 'D' {
                pending.space = true;
                i += 3;
                continue;
            }

            if c == '|' && matches!(two_digits(at(i + 1), at(i + 2)), Some(0..=31)) {
                // passed through for the display layer; zero width
                out.extend(&s[i..i + 3]);
                i += 3;
                continue;
            }

            if flags.contains(ParseFlags::MCI_CODES) && c == '[' {
                let cc = at(i + 1);
                let fixed = match cc {
                    '0' => Some("\x1b[?25l"),
                    '1' => Some("\x1b[?25h"),
                    'K' => Some("\x1b[K"),
                    _ => None,
                };
                if let Some(seq) = fixed {
                    out.push_str(seq);
                    i += 2;
                    continue;
                }
                if is_cursor_motion(cc) {
                    if let Some(n) = two_digits(at(i + 2), at(i + 3)) {
                        let seq = match cc {
                            'X' => {
                                col = n;
                                format!("\x1b[{}G", n)
                            }
                            'L' => {
                                col = n;
                                format!("\x1b[{}G\x1b[K", n)
                            }
                            'Y' => format!("\x1b[{}d", n),
                            _ => format!("\x1b[{}{}", n, cc),
                        };
                        out.push_str(&seq);
                        i += 4;
                        continue;
                    }
                }
            }

            if flags.contains(ParseFlags::MCI_CODES) && c == '|' && at(i + 1) == '&' && at(i + 2) == '&' {
                out.push_str("\x1b[6n");
                i += 3;
                continue;
            }

            if flags.contains(ParseFlags::PIPE_COLORS)
                && c == '|'
                && at(i + 1).is_ascii_lowercase()
                && at(i + 2).is_ascii_lowercase()
            {
                if let Some(expansion) = self.theme.as_ref().and_then(|t| t.lookup(at(i + 1), at(i + 2))) {
                    out.push_str(expansion);
                    i += 3;
                    continue;
                }
            }

            if flags.contains(ParseFlags::MCI_CODES) && c == '|' {
                let (a, b) = (at(i + 1), at(i + 2));
                if a.is_ascii_uppercase() && b.is_ascii_uppercase() {
                    if let Some(seq) = control_code(a, b) {
                        out.push_str(seq);
                        match (a, b) {
                            ('C', 'L') | ('C', 'R') => col = 1,
                            ('B', 'S') => col = col.saturating_sub(1).max(1),
                            _ => {}
                        }
                        i += 3;
                        continue;
                    }
                }
                if (a.is_ascii_uppercase() && b.is_ascii_uppercase()) || (a == 'U' && b == '#') {
                    if let Some(value) = self.info_value(a, b) {
                        col += emit_info(&mut out, value, &mut pending);
                        i += 3;
                        continue;
                    }
                }
            }

            out.push(c);
            if c == '\r' || c == '\n' {
                col = 1;
            } else {
                col += 1;
            }
            i += 1;
        }

        self.column = u32::try_from(col).unwrap_or(u32::MAX);
        out
    }
}

/// Writes an information value through the pending operators and returns
/// the visible width emitted.
fn emit_info(out: &mut String, value: String, pending: &mut Pending) -> usize {
    let mut value = value;
    if std::mem::take(&mut pending.space) {
        value.insert(0, ' ');
    }
    if let Some(width) = pending.trim.take() {
        value = trim_visible(&value, width);
    }
    let width = visible_len(&value);
    let Some((justify, target, pad)) = pending.justify.take() else {
        out.push_str(&value);
        return width;
    };
    let fill = target.saturating_sub(width);
    let (left, right) = match justify {
        Justify::Left => (fill, 0),
        Justify::Right => (0, fill),
        Justify::Center => (fill / 2, fill - fill / 2),
    };
    out.extend(std::iter::repeat(pad).take(left));
    out.push_str(&value);
    out.extend(std::iter::repeat(pad).take(right));
    left + width + right
}

#[cfg(test)]
mod tests {
    use super::super::{StaticInfo, Theme};
    use super::*;
    use chrono::NaiveDate;

    fn info() -> StaticInfo {
        StaticInfo::new()
            .with(InfoCode::BoardName, "Tiny BBS")
            .with(InfoCode::UserName, "Bob")
            .with(InfoCode::UserNumber, "42")
            .at(NaiveDate::from_ymd_opt(2024, 3, 5)
                .and_then(|d| d.and_hms_opt(14, 7, 9))
                .unwrap())
    }

    #[test]
    fn test_parameter_feeds_column_fill() {
        let mut ctx = TemplateContext::new();
        assert_eq!(ctx.expand("$X|!1-|CR", &[Param::from("10")]), "---------\r\n");
        assert_eq!(ctx.column(), 1);
    }

    #[test]
    fn test_positional_parameters() {
        let mut ctx = TemplateContext::new();
        let out = ctx.expand(
            "|!1 has |!2d new, |!3 unbound|!Fc",
            &[Param::from("Bob"), Param::from(5i32)],
        );
        assert_eq!(out, "Bob has 5 new,  unbound");
    }

    #[test]
    fn test_justification_and_trim() {
        let i = info();
        let mut ctx = TemplateContext::new().with_info(&i);
        assert_eq!(ctx.expand("[$L06|UN]", &[]), "[   Bob]");
        assert_eq!(ctx.expand("[$R06|UN]", &[]), "[Bob   ]");
        assert_eq!(ctx.expand("[$c07*|UN]", &[]), "[**Bob**]");
        assert_eq!(ctx.expand("$T04|BN", &[]), "Tiny");
        assert_eq!(ctx.expand("#|PD|U#", &[]), "# 42");
        // operators only apply to the next info code
        assert_eq!(ctx.expand("$L06|UN|UN", &[]), "   BobBob");
    }

    #[test]
    fn test_unknown_and_empty_codes_stay_literal() {
        let i = info();
        let mut ctx = TemplateContext::new().with_info(&i);
        assert_eq!(ctx.expand("|ZZ|UC", &[]), "|ZZ|UC");
        let mut bare = TemplateContext::new();
        assert_eq!(bare.expand("|UN", &[]), "|UN");
    }

    #[test]
    fn test_date_and_time_codes() {
        let i = info();
        let mut ctx = TemplateContext::new().with_info(&i);
        assert_eq!(ctx.expand("|DA |TM |TS", &[]), "05 Mar 24 14:07 14:07:09");
    }

    #[test]
    fn test_literals_and_repeats() {
        let mut ctx = TemplateContext::new();
        assert_eq!(ctx.expand("a||b $$5 $D03=", &[]), "a||b $5 ===");
        assert_eq!(ctx.expand("$Q12", &[]), "$Q12");
        assert_eq!(ctx.expand("$D05", &[]), "$D05");
    }

    #[test]
    fn test_cursor_and_control_codes() {
        let mut ctx = TemplateContext::new();
        assert_eq!(ctx.expand("[X05", &[]), "\x1b[5G");
        assert_eq!(ctx.column(), 5);
        assert_eq!(ctx.expand("[L10[A02[K[0[1", &[]), "\x1b[10G\x1b[K\x1b[2A\x1b[K\x1b[?25l\x1b[?25h");
        assert_eq!(ctx.expand("|CL|SA|RA|&&|LC", &[]), "\x0c\x1b7\x1b8\x1b[6n");
        assert_eq!(ctx.column(), 1);
    }

    #[test]
    fn test_theme_codes_and_colour_width() {
        let mut ctx = TemplateContext::new();
        assert_eq!(ctx.expand("|prName|07", &[]), "|14Name|07");
        assert_eq!(ctx.column(), 5);
        let mut plain = TemplateContext::new().with_theme(None);
        assert_eq!(plain.expand("|pr", &[]), "|pr");
        let mut custom = Theme::default();
        custom.set("prompt", "|11").unwrap();
        ctx.set_theme(Some(custom));
        assert_eq!(ctx.expand("|pr", &[]), "|11");
    }

    #[test]
    fn test_disabled_classes_pass_through() {
        let i = info();
        let mut ctx = TemplateContext::new().with_info(&i);
        ctx.set_flags(ParseFlags::PIPE_COLORS);
        assert_eq!(ctx.expand("|UN|!1$L05[K", &[Param::from("x")]), "|UN|!1$L05[K");
    }

    #[test]
    fn test_visible_len() {
        assert_eq!(visible_len("|14Hi||x"), 4);
        assert_eq!(visible_len("|UN|!1[X10ab"), 2);
        assert_eq!(visible_len("\x16\x01\x0fA"), 1);
        assert_eq!(trim_visible("|14Hello", 2), "|14He");
    }
}
