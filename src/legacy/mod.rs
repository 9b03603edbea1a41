//! # Legacy CTL import
//!
//! Readers for the keyword-oriented `*.ctl` files of a classic install and
//! the packed `protocol.max` record file. Each reader produces one of the
//! typed views in [`crate::schema`]; the exporter turns those into TOML.
//!
//! ## Line rules
//!
//! - Leading and trailing whitespace is dropped; blank lines and lines
//!   starting with `%` or `;` are comments.
//! - A keyword matches a line when the line starts with it
//!   (case-insensitive) and the keyword is followed by whitespace or the
//!   end of the line. The value is the rest of the line, trimmed.
//! - For single-valued keywords the first matching line wins.
//! - Booleans are true on a bare `Keyword` line and false on
//!   `No Keyword`, whichever comes first.
//!
//! A missing file reads as empty. Malformed blocks in the area and menu
//! files abort that one file with [`ConfigError::Parse`].
//!
//! [`ConfigError::Parse`]: crate::error::ConfigError::Parse

pub mod access;
pub mod areas;
pub mod colors;
pub mod language;
pub mod maxctl;
pub mod menus;
pub mod protocol;

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::fsutil;
use crate::schema::enums::atoi;

pub use access::parse_access_ctl;
pub use areas::{parse_file_areas, parse_msg_areas};
pub use colors::parse_colors_lh;
pub use language::parse_language_ctl;
pub use maxctl::MaxCtl;
pub use menus::parse_menus_ctl;
pub use protocol::{parse_protocols, ProtocolRecord, PROTOCOL_RECORD_LEN};

/// Whitespace as the legacy tools saw it, NBSP included.
pub(crate) fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{a0}'
}

pub(crate) fn trim(s: &str) -> &str {
    s.trim_matches(is_space)
}

/// Value after `kw` when `line` starts with it as a whole word.
pub fn kw_value<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let line = line.trim_start_matches(is_space);
    let head = line.get(..kw.len())?;
    if !head.eq_ignore_ascii_case(kw) {
        return None;
    }
    let rest = &line[kw.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if is_space(c) => Some(trim(rest)),
        Some(_) => None,
    }
}

/// First whitespace-delimited word of `s` and the trimmed remainder.
pub(crate) fn split_word(s: &str) -> (&str, &str) {
    let s = trim(s);
    match s.find(is_space) {
        Some(i) => (&s[..i], trim(&s[i..])),
        None => (s, ""),
    }
}

/// A keyword file held as its significant lines.
#[derive(Debug, Clone, Default)]
pub struct CtlFile {
    path: PathBuf,
    exists: bool,
    /// `(line number, trimmed text)` of every non-comment line.
    lines: Vec<(usize, String)>,
}

impl CtlFile {
    /// Reads `path`; a missing file gives an empty [`CtlFile`].
    pub fn load(path: &Path) -> Result<Self> {
        match fsutil::read_text_opt(path)? {
            Some(text) => {
                debug!("reading {}", path.display());
                Ok(Self::from_text(path, &text))
            }
            None => {
                debug!("{} not present, treating as empty", path.display());
                Ok(Self {
                    path: path.to_path_buf(),
                    ..Self::default()
                })
            }
        }
    }

    pub fn from_text(path: &Path, text: &str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .filter_map(|(i, l)| {
                let t = trim(l);
                if t.is_empty() || t.starts_with('%') || t.starts_with(';') {
                    None
                } else {
                    Some((i + 1, t.to_string()))
                }
            })
            .collect();
        Self {
            path: path.to_path_buf(),
            exists: true,
            lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines.iter().map(|(n, l)| (*n, l.as_str()))
    }

    /// Value of the first line carrying `kw`.
    pub fn find(&self, kw: &str) -> Option<&str> {
        self.lines.iter().find_map(|(_, l)| kw_value(l, kw))
    }

    /// Like [`find`](Self::find), trying each keyword spelling in turn.
    pub fn find_any(&self, kws: &[&str]) -> Option<&str> {
        kws.iter().find_map(|kw| self.find(kw))
    }

    /// Values of every line carrying `kw`, in file order.
    pub fn find_all<'a>(&'a self, kw: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lines.iter().filter_map(move |(_, l)| kw_value(l, kw))
    }

    pub fn string(&self, kw: &str) -> Option<String> {
        self.find(kw).map(str::to_string)
    }

    pub fn int(&self, kw: &str) -> Option<i32> {
        self.find(kw).map(atoi)
    }

    /// `Some(true)` for `kw`, `Some(false)` for `No kw`, `None` if neither
    /// appears.
    pub fn flag(&self, kw: &str) -> Option<bool> {
        let negated = format!("No {}", kw);
        self.lines.iter().find_map(|(_, l)| {
            if kw_value(l, kw).is_some() {
                Some(true)
            } else if kw_value(l, &negated).is_some() {
                Some(false)
            } else {
                None
            }
        })
    }

    pub fn bool(&self, kw: &str) -> bool {
        self.flag(kw).unwrap_or(false)
    }

    /// True if any line carries `kw`.
    pub fn has(&self, kw: &str) -> bool {
        self.find(kw).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctl(text: &str) -> CtlFile {
        CtlFile::from_text(Path::new("max.ctl"), text)
    }

    #[test]
    fn test_kw_value_requires_word_boundary() {
        assert_eq!(kw_value("Name  Night Owl ", "name"), Some("Night Owl"));
        assert_eq!(kw_value("Path Menu", "Path Menu"), Some(""));
        assert_eq!(kw_value("Names x", "Name"), None);
        assert_eq!(kw_value("Na", "Name"), None);
        assert_eq!(kw_value("Name\u{a0}NBSP", "Name"), Some("NBSP"));
    }

    #[test]
    fn test_comments_and_first_match() {
        let c = ctl("% comment\n; also\n  Task 3\nTask 4\n\nSysOp Joe\n");
        assert_eq!(c.int("Task"), Some(3));
        assert_eq!(c.string("SysOp").as_deref(), Some("Joe"));
        assert_eq!(c.find("Missing"), None);
        assert_eq!(c.lines().count(), 3);
    }

    #[test]
    fn test_flags() {
        let c = ctl("No Snoop\nSnoop\nSwap\n");
        assert_eq!(c.flag("Snoop"), Some(false));
        assert_eq!(c.flag("Swap"), Some(true));
        assert_eq!(c.flag("Reboot"), None);
        assert!(!c.bool("Reboot"));
    }

    #[test]
    fn test_find_all_and_missing_file() {
        let c = ctl("Address 1:2/3\nAddress 1:2/4.1\n");
        assert_eq!(c.find_all("Address").collect::<Vec<_>>(), ["1:2/3", "1:2/4.1"]);

        let dir = tempfile::tempdir().unwrap();
        let missing = CtlFile::load(&dir.path().join("max.ctl")).unwrap();
        assert!(!missing.exists());
        assert_eq!(missing.lines().count(), 0);
    }

    #[test]
    fn test_split_word() {
        assert_eq!(split_word("  Com1   fast "), ("Com1", "fast"));
        assert_eq!(split_word("single"), ("single", ""));
    }
}
