//! Line-oriented parser for the configuration TOML subset.
//!
//! Supported: `#` comments outside strings, `[a.b]` tables, `[[a.b]]` table
//! lists, `key = value` (bare, quoted, or dotted keys), double-quoted strings
//! with `\\ \" \n \r \t \b \f \a \xHH` escapes, booleans, signed decimal
//! integers, homogeneous string and int lists, inline tables and lists of
//! inline tables. Every value must fit on its line.

use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::fsutil;

use super::{Table, Value};

/// Reads and parses a file. A missing file is `NotFound`.
pub fn parse_file(path: &Path) -> Result<Table> {
    let text = fsutil::read_text(path)?;
    parse_str(&text, &path.display().to_string())
}

/// Parses `text`; `source` names the input in error messages.
pub fn parse_str(text: &str, source: &str) -> Result<Table> {
    let mut root = Table::new();
    // Section currently receiving keys, as header segments. A table-list
    // header also records that its last segment addresses the newest element.
    let mut section: Vec<String> = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let err = |msg: String| ConfigError::parse(source, lineno, msg);
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(inner) = line.strip_prefix("[[") {
            let name = inner
                .strip_suffix("]]")
                .ok_or_else(|| err("unterminated table-list header".into()))?;
            let segs = split_header(name.trim()).map_err(err)?;
            append_table_list(&mut root, &segs).map_err(|e| err(e.to_string()))?;
            section = segs;
            continue;
        }

        if let Some(inner) = line.strip_prefix('[') {
            let name = inner
                .strip_suffix(']')
                .ok_or_else(|| err("unterminated table header".into()))?;
            let segs = split_header(name.trim()).map_err(err)?;
            section_table(&mut root, &segs).map_err(|e| err(e.to_string()))?;
            section = segs;
            continue;
        }

        let mut cur = Cursor::new(line);
        let key_path = cur.parse_key_path().map_err(err)?;
        cur.skip_ws();
        if !cur.eat('=') {
            return Err(err(format!("expected '=' in '{}'", line)));
        }
        let value = cur.parse_value().map_err(err)?;
        cur.skip_ws();
        if !cur.at_end() {
            return Err(err(format!("trailing characters after value: '{}'", cur.rest())));
        }

        let target = section_table(&mut root, &section).map_err(|e| err(e.to_string()))?;
        insert_dotted(target, &key_path, value).map_err(|e| err(e.to_string()))?;
    }

    Ok(root)
}

/// Removes a `#` comment that is not inside a string.
fn strip_comment(line: &str) -> &str {
    let mut in_str = false;
    let mut esc = false;
    for (i, c) in line.char_indices() {
        if in_str {
            if esc {
                esc = false;
            } else if c == '\\' {
                esc = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '#' => return &line[..i],
            _ => {}
        }
    }
    line
}

fn split_header(name: &str) -> std::result::Result<Vec<String>, String> {
    let mut cur = Cursor::new(name);
    let segs = cur.parse_key_path()?;
    cur.skip_ws();
    if !cur.at_end() {
        return Err(format!("bad header '{}'", name));
    }
    Ok(segs)
}

/// Walks header segments from the root. Table lists are entered through
/// their last element; missing segments become tables.
fn section_table<'a>(root: &'a mut Table, segs: &[String]) -> Result<&'a mut Table> {
    let mut cur = root;
    for seg in segs {
        if cur.get(seg).is_none() {
            cur.insert(seg.as_str(), Value::Table(Table::new()));
        }
        cur = match cur.get_mut(seg) {
            Some(Value::Table(t)) => t,
            Some(Value::TableList(list)) => list
                .last_mut()
                .ok_or_else(|| ConfigError::invalid(format!("empty table list '{}'", seg)))?,
            Some(other) => {
                return Err(ConfigError::invalid(format!(
                    "'{}' is a {}, not a table",
                    seg,
                    other.type_name()
                )))
            }
            None => return Err(ConfigError::not_found(seg.as_str())),
        };
    }
    Ok(cur)
}

fn append_table_list(root: &mut Table, segs: &[String]) -> Result<()> {
    let (last, parents) = segs
        .split_last()
        .ok_or_else(|| ConfigError::invalid("empty table-list header"))?;
    let parent = section_table(root, parents)?;
    if parent.get(last).is_none() {
        parent.insert(last.as_str(), Value::TableList(Vec::new()));
    }
    match parent.get_mut(last) {
        Some(Value::TableList(list)) => {
            list.try_reserve(1)?;
            list.push(Table::new());
            Ok(())
        }
        Some(other) => Err(ConfigError::invalid(format!(
            "'{}' is a {}, not a table list",
            last,
            other.type_name()
        ))),
        None => Err(ConfigError::not_found(last.as_str())),
    }
}

fn insert_dotted(table: &mut Table, key_path: &[String], value: Value) -> Result<()> {
    let (last, parents) = key_path
        .split_last()
        .ok_or_else(|| ConfigError::invalid("empty key"))?;
    let mut cur = table;
    for p in parents {
        cur = cur.table_mut(p)?;
    }
    cur.insert(last.as_str(), value);
    Ok(())
}

fn is_bare_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Byte cursor over one line.
struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += want.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn parse_key(&mut self) -> std::result::Result<String, String> {
        self.skip_ws();
        if self.peek() == Some('"') {
            return self.parse_string();
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_bare_key_char(c)) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(format!("expected a key at '{}'", self.rest()));
        }
        Ok(self.s[start..self.pos].to_string())
    }

    fn parse_key_path(&mut self) -> std::result::Result<Vec<String>, String> {
        let mut parts = vec![self.parse_key()?];
        loop {
            self.skip_ws();
            if !self.eat('.') {
                break;
            }
            parts.push(self.parse_key()?);
        }
        Ok(parts)
    }

    fn parse_string(&mut self) -> std::result::Result<String, String> {
        if !self.eat('"') {
            return Err("expected '\"'".into());
        }
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or("unterminated string")?;
            match c {
                '"' => return Ok(out),
                '\\' => {
                    let e = self.bump().ok_or("unterminated escape")?;
                    match e {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'a' => out.push('\x07'),
                        'b' => out.push('\x08'),
                        'f' => out.push('\x0c'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        'x' => {
                            let hex = self.rest().get(..2).filter(|h| {
                                h.bytes().all(|b| b.is_ascii_hexdigit())
                            });
                            match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                                Some(b) => {
                                    self.pos += 2;
                                    out.push(char::from(b));
                                }
                                None => out.push('x'),
                            }
                        }
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn parse_int(&mut self) -> std::result::Result<i64, String> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        let digits = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == digits {
            return Err(format!("unrecognized value '{}'", &self.s[start..]));
        }
        self.s[start..self.pos]
            .parse::<i64>()
            .map_err(|e| format!("bad integer '{}': {}", &self.s[start..self.pos], e))
    }

    fn keyword(&mut self, word: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(word) {
            return false;
        }
        let after = rest[word.len()..].chars().next();
        if matches!(after, Some(c) if is_bare_key_char(c)) {
            return false;
        }
        self.pos += word.len();
        true
    }

    fn parse_value(&mut self) -> std::result::Result<Value, String> {
        self.skip_ws();
        match self.peek() {
            Some('"') => self.parse_string().map(Value::Str),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_inline_table().map(Value::Table),
            Some(_) if self.keyword("true") => Ok(Value::Bool(true)),
            Some(_) if self.keyword("false") => Ok(Value::Bool(false)),
            Some(_) => self.parse_int().map(Value::Int),
            None => Err("missing value".into()),
        }
    }

    /// Arrays are typed by their first element: strings, ints, or inline
    /// tables. An empty array is a string list.
    fn parse_array(&mut self) -> std::result::Result<Value, String> {
        self.eat('[');
        self.skip_ws();
        let kind = self.peek();
        let mut strs = Vec::new();
        let mut ints = Vec::new();
        let mut tables = Vec::new();

        loop {
            self.skip_ws();
            if self.eat(']') {
                break;
            }
            match (kind, self.peek()) {
                (Some('"'), Some('"')) => strs.push(self.parse_string()?),
                (Some('{'), Some('{')) => tables.push(self.parse_inline_table()?),
                (Some('-' | '+' | '0'..='9'), Some('-' | '+' | '0'..='9')) => {
                    ints.push(self.parse_int()?)
                }
                (_, None) => return Err("unterminated array".into()),
                (_, Some(c)) => return Err(format!("mixed or unsupported array element at '{}'", c)),
            }
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                break;
            }
            return Err(format!("expected ',' or ']' at '{}'", self.rest()));
        }

        Ok(match kind {
            Some('{') => Value::TableList(tables),
            Some('-' | '+' | '0'..='9') => Value::IntList(ints),
            _ => Value::StrList(strs),
        })
    }

    fn parse_inline_table(&mut self) -> std::result::Result<Table, String> {
        self.eat('{');
        let mut table = Table::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(table);
            }
            let key_path = self.parse_key_path()?;
            self.skip_ws();
            if !self.eat('=') {
                return Err(format!("expected '=' in inline table at '{}'", self.rest()));
            }
            let value = self.parse_value()?;
            insert_dotted(&mut table, &key_path, value).map_err(|e| e.to_string())?;
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                return Ok(table);
            }
            return Err(format!("expected ',' or '}}' at '{}'", self.rest()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::get_path;

    #[test]
    fn test_scalars_and_escapes() {
        let t = parse_str(
            "a = \"\"\nb = \"a\\xff\"\nc = \"tab\\there # not a comment\" # comment\nd = -42\ne = true\n",
            "t",
        )
        .unwrap();
        assert_eq!(t.get("a"), Some(&Value::Str(String::new())));
        assert_eq!(t.get("b"), Some(&Value::Str("a\u{ff}".into())));
        assert_eq!(t.get("c"), Some(&Value::Str("tab\there # not a comment".into())));
        assert_eq!(t.get("d"), Some(&Value::Int(-42)));
        assert_eq!(t.get("e"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_mixed_arrays_rejected() {
        assert!(parse_str("x = [\"a\", 1]\n", "t").is_err());
        assert!(parse_str("x = [1, \"a\"]\n", "t").is_err());
        let t = parse_str("x = []\ny = [1, -2]\n", "t").unwrap();
        assert_eq!(t.get("x"), Some(&Value::StrList(vec![])));
        assert_eq!(t.get("y"), Some(&Value::IntList(vec![1, -2])));
    }

    #[test]
    fn test_unrecognized_value_is_io_error() {
        let err = parse_str("ok = 1\nbad = wat\n", "cfg.toml").unwrap_err();
        assert_eq!(err.status(), crate::error::Status::Io);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_sections_and_table_lists() {
        let text = "\
[theme.colors]
text = \"|07\"

[[area]]
name = \"a\"
[area.extra]
k = 1

[[area]]
name = \"b\"

[[menu.option]]
command = \"Goodbye\"
";
        let t = parse_str(text, "t").unwrap();
        assert_eq!(get_path(&t, "theme.colors.text").unwrap().as_str(), Some("|07"));
        assert_eq!(get_path(&t, "area[0].extra.k").unwrap().as_int(), Some(1));
        assert_eq!(get_path(&t, "area[1].name").unwrap().as_str(), Some("b"));
        assert_eq!(get_path(&t, "menu.option[0].command").unwrap().as_str(), Some("Goodbye"));
    }

    #[test]
    fn test_inline_tables_and_quoted_keys() {
        let text = "\
\"0x0001\" = \"global.yes\"
lightbar_color = { normal = [\"Gray\", \"Black\"], selected = [\"Yellow\", \"Blue\"] }
items = [{ k = 1 }, { k = 2 }]
";
        let t = parse_str(text, "t").unwrap();
        assert_eq!(t.get("0x0001"), Some(&Value::Str("global.yes".into())));
        assert_eq!(
            get_path(&t, "lightbar_color.selected[1]").unwrap().as_str(),
            Some("Blue")
        );
        assert_eq!(get_path(&t, "items[1].k").unwrap().as_int(), Some(2));
    }

    #[test]
    fn test_key_order_preserved() {
        let t = parse_str("z = 1\na = 2\nm = 3\n", "t").unwrap();
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }
}
