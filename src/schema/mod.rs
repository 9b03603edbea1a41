//! # Typed schema views
//!
//! Each view is a plain struct copied out of a [`Document`]. Views own their
//! strings and lists; dropping the view releases them.
//!
//! ## Reading
//!
//! `View::from_document(doc, prefix)` reads the table mounted at `prefix`.
//! Missing keys take the schema default. A key holding the wrong type fails
//! the whole read with [`ConfigError::InvalidArgument`]; nothing is returned
//! half-filled.
//!
//! ## Writing
//!
//! `view.to_toml()` renders the canonical file for the view. Output depends
//! only on the view contents, so a write / read / write cycle is stable.

pub mod access;
pub mod areas;
pub mod colors;
pub mod display;
pub mod enums;
pub mod equipment;
pub mod language;
pub mod matrix;
pub mod menu;
pub mod protocol;
pub mod reader;
pub mod session;
pub mod system;

pub use access::{AccessLevel, AccessLevels};
pub use areas::{Division, FileArea, FileAreas, MsgArea, MsgAreas};
pub use colors::{Color, Colors};
pub use display::DisplayFiles;
pub use equipment::Equipment;
pub use language::Language;
pub use matrix::{AttributePriv, Matrix, NetAddress};
pub use menu::{CustomMenu, Menu, MenuOption};
pub use protocol::{Protocol, ProtocolList};
pub use reader::Reader;
pub use session::Session;
pub use system::System;

use std::fmt::Write as _;

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::value::{emit, Table, ValueRef};

enum Source<'a> {
    Doc { doc: &'a Document, prefix: String },
    Table(&'a Table),
}

/// Field reader over either a document prefix (overrides honoured) or a
/// bare table such as one element of a `[[...]]` list.
pub struct Fields<'a> {
    source: Source<'a>,
}

impl<'a> Fields<'a> {
    /// Reader for the table at `prefix`. The prefix must name a table.
    pub fn of_document(doc: &'a Document, prefix: &str) -> Result<Self> {
        match doc.get(prefix)? {
            ValueRef::Table(_) => Ok(Self {
                source: Source::Doc {
                    doc,
                    prefix: prefix.to_string(),
                },
            }),
            other => Err(ConfigError::invalid(format!(
                "'{}' is a {}, expected a table",
                prefix,
                other.type_name()
            ))),
        }
    }

    pub fn of_table(table: &'a Table) -> Self {
        Self {
            source: Source::Table(table),
        }
    }

    fn describe(&self, key: &str) -> String {
        match &self.source {
            Source::Doc { prefix, .. } if !prefix.is_empty() => format!("{}.{}", prefix, key),
            _ => key.to_string(),
        }
    }

    fn lookup(&self, key: &str) -> Result<Option<ValueRef<'a>>> {
        match &self.source {
            Source::Table(t) => Ok(t.get(key).map(|v| v.as_ref())),
            Source::Doc { doc, prefix } => {
                let path = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", prefix, key)
                };
                match doc.get(&path) {
                    Ok(v) => Ok(Some(v)),
                    Err(ConfigError::NotFound(_)) => Ok(None),
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn mismatch(&self, key: &str, want: &str, got: ValueRef<'_>) -> ConfigError {
        ConfigError::invalid(format!(
            "{}: expected {}, found {}",
            self.describe(key),
            want,
            got.type_name()
        ))
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.lookup(key)?.is_some())
    }

    /// String field; missing yields `""`.
    pub fn str(&self, key: &str) -> Result<String> {
        self.str_or(key, "")
    }

    pub fn str_or(&self, key: &str, default: &str) -> Result<String> {
        match self.lookup(key)? {
            None => Ok(default.to_string()),
            Some(ValueRef::Str(s)) => Ok(s.to_string()),
            Some(other) => Err(self.mismatch(key, "string", other)),
        }
    }

    /// Signed field; accepts `int` or a `uint` that fits.
    pub fn int(&self, key: &str, default: i32) -> Result<i32> {
        match self.lookup(key)? {
            None => Ok(default),
            Some(v @ (ValueRef::Int(_) | ValueRef::Uint(_))) => v
                .as_int()
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(|| ConfigError::invalid(format!("{}: out of range", self.describe(key)))),
            Some(other) => Err(self.mismatch(key, "integer", other)),
        }
    }

    /// Unsigned field; accepts `uint` or a non-negative `int`.
    pub fn uint(&self, key: &str, default: u32) -> Result<u32> {
        let out_of_range = || ConfigError::invalid(format!("{}: out of range", self.describe(key)));
        match self.lookup(key)? {
            None => Ok(default),
            Some(ValueRef::Uint(u)) => u32::try_from(u).map_err(|_| out_of_range()),
            Some(ValueRef::Int(i)) if i >= 0 => u32::try_from(i).map_err(|_| out_of_range()),
            Some(other) => Err(self.mismatch(key, "unsigned integer", other)),
        }
    }

    pub fn bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.lookup(key)? {
            None => Ok(default),
            Some(ValueRef::Bool(b)) => Ok(b),
            Some(other) => Err(self.mismatch(key, "boolean", other)),
        }
    }

    pub fn str_list(&self, key: &str) -> Result<Vec<String>> {
        match self.lookup(key)? {
            None => Ok(Vec::new()),
            Some(ValueRef::StrList(l)) => Ok(l.to_vec()),
            Some(other) => Err(self.mismatch(key, "string list", other)),
        }
    }

    pub fn int_list(&self, key: &str) -> Result<Vec<i64>> {
        match self.lookup(key)? {
            None => Ok(Vec::new()),
            Some(ValueRef::IntList(l)) => Ok(l.to_vec()),
            Some(other) => Err(self.mismatch(key, "int list", other)),
        }
    }

    /// Raw access for fields with more than one accepted shape.
    pub fn raw(&self, key: &str) -> Result<Option<ValueRef<'a>>> {
        self.lookup(key)
    }

    /// Child table, `None` when absent.
    pub fn table(&self, key: &str) -> Result<Option<Fields<'a>>> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ValueRef::Table(t)) => Ok(Some(Fields::of_table(t))),
            Some(other) => Err(self.mismatch(key, "table", other)),
        }
    }

    /// Elements of a `[[key]]` list; absent yields an empty list.
    pub fn table_list(&self, key: &str) -> Result<Vec<Fields<'a>>> {
        match self.lookup(key)? {
            None => Ok(Vec::new()),
            Some(ValueRef::TableList(l)) => Ok(l.iter().map(Fields::of_table).collect()),
            Some(other) => Err(self.mismatch(key, "table list", other)),
        }
    }
}

/// Line-oriented builder for the canonical view files.
#[derive(Debug, Default)]
pub struct TomlWriter {
    out: String,
}

impl TomlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, key: &str) {
        self.out.push_str(&emit::format_key(key));
        self.out.push_str(" = ");
    }

    pub fn str(&mut self, key: &str, value: &str) -> &mut Self {
        self.key(key);
        self.out.push_str(&emit::escape_string(value));
        self.out.push('\n');
        self
    }

    pub fn int(&mut self, key: &str, value: i64) -> &mut Self {
        let _ = writeln!(self.out, "{} = {}", emit::format_key(key), value);
        self
    }

    pub fn uint(&mut self, key: &str, value: u64) -> &mut Self {
        let _ = writeln!(self.out, "{} = {}", emit::format_key(key), value);
        self
    }

    pub fn bool(&mut self, key: &str, value: bool) -> &mut Self {
        let _ = writeln!(self.out, "{} = {}", emit::format_key(key), value);
        self
    }

    pub fn str_list(&mut self, key: &str, items: &[String]) -> &mut Self {
        self.key(key);
        self.out.push_str(&emit::inline_str_list(items));
        self.out.push('\n');
        self
    }

    pub fn int_list(&mut self, key: &str, items: &[i64]) -> &mut Self {
        self.key(key);
        self.out.push_str(&emit::inline_int_list(items));
        self.out.push('\n');
        self
    }

    /// Writes `key = <already rendered value>`.
    pub fn inline(&mut self, key: &str, rendered: &str) -> &mut Self {
        self.key(key);
        self.out.push_str(rendered);
        self.out.push('\n');
        self
    }

    fn gap(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// `[name]` header, separated from earlier output by one blank line.
    pub fn section(&mut self, name: &str) -> &mut Self {
        self.gap();
        let _ = writeln!(self.out, "[{}]", name);
        self
    }

    /// `[[name]]` header for one element of a table list.
    pub fn list_entry(&mut self, name: &str) -> &mut Self {
        self.gap();
        let _ = writeln!(self.out, "[[{}]]", name);
        self
    }

    /// `# === title ===` banner used by the system file.
    pub fn banner(&mut self, title: &str) -> &mut Self {
        self.gap();
        let _ = writeln!(self.out, "# === {} ===", title);
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        let _ = writeln!(self.out, "# {}", text);
        self
    }

    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::parse_str;

    fn doc_with(text: &str, prefix: &str) -> Document {
        let mut doc = Document::new();
        doc.mount(parse_str(text, "t").unwrap(), prefix).unwrap();
        doc
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let doc = doc_with("x = 1\n", "general.session");
        let f = Fields::of_document(&doc, "general.session").unwrap();
        assert_eq!(f.str("nope").unwrap(), "");
        assert_eq!(f.int("nope", -1).unwrap(), -1);
        assert!(f.bool("nope", true).unwrap());
        assert!(f.str_list("nope").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_type_is_invalid() {
        let doc = doc_with("name = 5\nflag = \"yes\"\nneg = -1\n", "m");
        let f = Fields::of_document(&doc, "m").unwrap();
        assert!(matches!(f.str("name"), Err(ConfigError::InvalidArgument(_))));
        assert!(matches!(f.bool("flag", false), Err(ConfigError::InvalidArgument(_))));
        assert!(matches!(f.uint("neg", 0), Err(ConfigError::InvalidArgument(_))));
        assert_eq!(f.uint("name", 0).unwrap(), 5);
    }

    #[test]
    fn test_overrides_are_visible_to_views() {
        let mut doc = doc_with("name = \"old\"\n", "m");
        doc.set_string("m.name", "new").unwrap();
        let f = Fields::of_document(&doc, "m").unwrap();
        assert_eq!(f.str("name").unwrap(), "new");
    }

    #[test]
    fn test_prefix_must_be_table() {
        let doc = doc_with("name = \"x\"\n", "m");
        assert!(matches!(
            Fields::of_document(&doc, "m.name"),
            Err(ConfigError::InvalidArgument(_))
        ));
        assert!(matches!(
            Fields::of_document(&doc, "absent"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_writer_sections_are_separated() {
        let mut w = TomlWriter::new();
        w.str("name", "a\"b").int("n", -2);
        w.section("custom_menu").bool("show_title", true);
        w.list_entry("option").str_list("modifiers", &["NoDsp".to_string()]);
        assert_eq!(
            w.finish(),
            "name = \"a\\\"b\"\nn = -2\n\n[custom_menu]\nshow_title = true\n\n[[option]]\nmodifiers = [\"NoDsp\"]\n"
        );
    }
}
