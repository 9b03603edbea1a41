//! # Untyped configuration tree
//!
//! Every configuration file is parsed into a [`Table`]: an insertion-ordered
//! map from keys to [`Value`]s. Typed views in [`crate::schema`] copy out of
//! this tree; the [`crate::document::Document`] layers overrides over it.
//!
//! ## Paths
//!
//! Values are addressed by dotted paths:
//!
//! ```text
//! path    = segment ( '.' segment )*
//! segment = ident | ident '[' digits ']'
//! ```
//!
//! Indexing a string list yields a string, an int list yields an int, and a
//! table list yields the indexed table. [`get_path`] reports missing segments
//! as `NotFound`; [`set_path`] creates interior tables and grows interior
//! table lists (with empty tables) and string lists (with empty strings) up
//! to the requested index.
//!
//! ## Submodules
//!
//! - [`parser`] - line-oriented reader for the supported TOML subset
//! - [`emit`] - canonical writer (scalars, then table lists, then tables)

pub mod emit;
pub mod parser;

use std::fmt;

use crate::error::{ConfigError, Result};

pub use emit::{emit_table, escape_string};
pub use parser::{parse_file, parse_str};

/// A node of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Uint(u64),
    Bool(bool),
    Str(String),
    StrList(Vec<String>),
    IntList(Vec<i64>),
    Table(Table),
    TableList(Vec<Table>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        self.as_ref().type_name()
    }

    pub fn as_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Null => ValueRef::Null,
            Value::Int(i) => ValueRef::Int(*i),
            Value::Uint(u) => ValueRef::Uint(*u),
            Value::Bool(b) => ValueRef::Bool(*b),
            Value::Str(s) => ValueRef::Str(s),
            Value::StrList(l) => ValueRef::StrList(l),
            Value::IntList(l) => ValueRef::IntList(l),
            Value::Table(t) => ValueRef::Table(t),
            Value::TableList(l) => ValueRef::TableList(l),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Table(_) | Value::TableList(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

/// Borrowed view of a [`Value`], or of a scalar element inside a list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Null,
    Int(i64),
    Uint(u64),
    Bool(bool),
    Str(&'a str),
    StrList(&'a [String]),
    IntList(&'a [i64]),
    Table(&'a Table),
    TableList(&'a [Table]),
}

impl<'a> ValueRef<'a> {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueRef::Null => "null",
            ValueRef::Int(_) => "int",
            ValueRef::Uint(_) => "uint",
            ValueRef::Bool(_) => "bool",
            ValueRef::Str(_) => "string",
            ValueRef::StrList(_) => "string list",
            ValueRef::IntList(_) => "int list",
            ValueRef::Table(_) => "table",
            ValueRef::TableList(_) => "table list",
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            ValueRef::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ValueRef::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Signed view of `Int` or an in-range `Uint`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ValueRef::Int(i) => Some(*i),
            ValueRef::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&'a Table> {
        match self {
            ValueRef::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&'a [String]> {
        match self {
            ValueRef::StrList(l) => Some(l),
            _ => None,
        }
    }

    /// Element count of a list or table; `None` for scalars.
    pub fn count(&self) -> Option<usize> {
        match self {
            ValueRef::StrList(l) => Some(l.len()),
            ValueRef::IntList(l) => Some(l.len()),
            ValueRef::TableList(l) => Some(l.len()),
            ValueRef::Table(t) => Some(t.len()),
            _ => None,
        }
    }

    /// Key lookup on a table view.
    pub fn get(&self, key: &str) -> Result<ValueRef<'a>> {
        match self {
            ValueRef::Table(t) => t
                .get(key)
                .map(Value::as_ref)
                .ok_or_else(|| ConfigError::not_found(key)),
            other => Err(ConfigError::invalid(format!(
                "cannot look up '{}' in a {}",
                key,
                other.type_name()
            ))),
        }
    }

    /// Index lookup on a list view.
    pub fn index(&self, i: usize) -> Result<ValueRef<'a>> {
        let missing = || ConfigError::not_found(format!("[{}]", i));
        match self {
            ValueRef::StrList(l) => l.get(i).map(|s| ValueRef::Str(s)).ok_or_else(missing),
            ValueRef::IntList(l) => l.get(i).map(|v| ValueRef::Int(*v)).ok_or_else(missing),
            ValueRef::TableList(l) => l.get(i).map(ValueRef::Table).ok_or_else(missing),
            other => Err(ConfigError::invalid(format!("cannot index a {}", other.type_name()))),
        }
    }

    pub fn to_owned_value(&self) -> Value {
        match self {
            ValueRef::Null => Value::Null,
            ValueRef::Int(i) => Value::Int(*i),
            ValueRef::Uint(u) => Value::Uint(*u),
            ValueRef::Bool(b) => Value::Bool(*b),
            ValueRef::Str(s) => Value::Str((*s).to_string()),
            ValueRef::StrList(l) => Value::StrList(l.to_vec()),
            ValueRef::IntList(l) => Value::IntList(l.to_vec()),
            ValueRef::Table(t) => Value::Table((*t).clone()),
            ValueRef::TableList(l) => Value::TableList(l.to_vec()),
        }
    }
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Null => Ok(()),
            ValueRef::Int(i) => write!(f, "{}", i),
            ValueRef::Uint(u) => write!(f, "{}", u),
            ValueRef::Bool(b) => write!(f, "{}", b),
            ValueRef::Str(s) => f.write_str(s),
            ValueRef::StrList(l) => write!(f, "{}", emit::inline_str_list(l)),
            ValueRef::IntList(l) => write!(f, "{}", emit::inline_int_list(l)),
            ValueRef::Table(t) => write!(f, "<table of {}>", t.len()),
            ValueRef::TableList(l) => write!(f, "<{} tables>", l.len()),
        }
    }
}

/// Insertion-ordered key/value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    entries: Vec<(String, Value)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replaces an existing key in place, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Child table at `key`, created when absent. Errors when the key holds
    /// something other than a table.
    pub fn table_mut(&mut self, key: &str) -> Result<&mut Table> {
        if self.get(key).is_none() {
            self.entries.push((key.to_string(), Value::Table(Table::new())));
        }
        match self.get_mut(key) {
            Some(Value::Table(t)) => Ok(t),
            Some(other) => Err(ConfigError::invalid(format!(
                "'{}' is a {}, not a table",
                key,
                other.type_name()
            ))),
            None => Err(ConfigError::not_found(key)),
        }
    }

    /// Merges `other` into this table key by key; same-named keys are
    /// replaced in place.
    pub fn merge(&mut self, other: Table) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }
}

impl FromIterator<(String, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut t = Table::new();
        for (k, v) in iter {
            t.insert(k, v);
        }
        t
    }
}

/// One parsed path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub name: &'a str,
    pub index: Option<usize>,
}

fn parse_segment(seg: &str) -> Result<Segment<'_>> {
    if seg.is_empty() {
        return Err(ConfigError::invalid("empty path segment"));
    }
    let Some(open) = seg.find('[') else {
        return Ok(Segment { name: seg, index: None });
    };
    let name = &seg[..open];
    let rest = &seg[open + 1..];
    let digits = rest
        .strip_suffix(']')
        .ok_or_else(|| ConfigError::invalid(format!("unterminated index in '{}'", seg)))?;
    if name.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::invalid(format!("bad path segment '{}'", seg)));
    }
    let index = digits
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid(format!("index out of range in '{}'", seg)))?;
    Ok(Segment { name, index: Some(index) })
}

/// Splits a dotted path into segments. The empty path has no segments.
pub fn split_path(path: &str) -> Result<Vec<Segment<'_>>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    path.split('.').map(parse_segment).collect()
}

/// Looks up `path` below `root`.
pub fn get_path<'a>(root: &'a Table, path: &str) -> Result<ValueRef<'a>> {
    let segments = split_path(path)?;
    let mut cur = ValueRef::Table(root);
    let last = segments.len().saturating_sub(1);

    for (i, seg) in segments.iter().enumerate() {
        let table = cur
            .as_table()
            .ok_or_else(|| ConfigError::not_found(path))?;
        let child = table.get(seg.name).ok_or_else(|| ConfigError::not_found(path))?;
        cur = child.as_ref();

        if let Some(idx) = seg.index {
            cur = match cur {
                ValueRef::TableList(_) => cur.index(idx),
                ValueRef::StrList(_) | ValueRef::IntList(_) if i == last => cur.index(idx),
                _ => Err(ConfigError::not_found(path)),
            }
            .map_err(|_| ConfigError::not_found(path))?;
        }
    }
    Ok(cur)
}

/// Installs `value` at `path`, creating interior tables and growing lists
/// as needed.
pub fn set_path(root: &mut Table, path: &str, value: Value) -> Result<()> {
    let segments = split_path(path)?;
    if segments.is_empty() {
        return Err(ConfigError::invalid("cannot replace the root table"));
    }
    set_in(root, &segments, value)
}

fn set_in(table: &mut Table, segments: &[Segment<'_>], value: Value) -> Result<()> {
    let (seg, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return Err(ConfigError::invalid("empty path")),
    };
    let is_last = rest.is_empty();

    let Some(idx) = seg.index else {
        if is_last {
            table.insert(seg.name, value);
            return Ok(());
        }
        let child = table.table_mut(seg.name)?;
        return set_in(child, rest, value);
    };

    if table.get(seg.name).is_none() {
        let fresh = match &value {
            Value::Str(_) if is_last => Value::StrList(Vec::new()),
            Value::Int(_) if is_last => Value::IntList(Vec::new()),
            _ => Value::TableList(Vec::new()),
        };
        table.insert(seg.name, fresh);
    }

    let slot = table
        .get_mut(seg.name)
        .ok_or_else(|| ConfigError::not_found(seg.name))?;

    match (slot, value) {
        (Value::TableList(list), value) => {
            if list.len() <= idx {
                list.try_reserve(idx + 1 - list.len())?;
                list.resize_with(idx + 1, Table::new);
            }
            match (is_last, value) {
                (true, Value::Table(t)) => {
                    list[idx] = t;
                    Ok(())
                }
                (true, other) => Err(ConfigError::invalid(format!(
                    "cannot store a {} as table list element",
                    other.type_name()
                ))),
                (false, value) => set_in(&mut list[idx], rest, value),
            }
        }
        (Value::StrList(list), Value::Str(s)) if is_last => {
            if list.len() <= idx {
                list.try_reserve(idx + 1 - list.len())?;
                list.resize(idx + 1, String::new());
            }
            list[idx] = s;
            Ok(())
        }
        (Value::IntList(list), Value::Int(v)) if is_last => {
            if list.len() <= idx {
                list.try_reserve(idx + 1 - list.len())?;
                list.resize(idx + 1, 0);
            }
            list[idx] = v;
            Ok(())
        }
        (slot, value) => Err(ConfigError::invalid(format!(
            "cannot assign {} through index of {}",
            value.type_name(),
            slot.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        parse_str(
            "config_version = 1\nsystem_name = \"ACME\"\n[[area]]\nname = \"MUF\"\nstyle = [\"Squish\",\"Local\",\"Pub\"]\n",
            "sample",
        )
        .unwrap()
    }

    #[test]
    fn test_indexed_lookup() {
        let t = sample();
        assert_eq!(get_path(&t, "area[0].name").unwrap().as_str(), Some("MUF"));
        assert_eq!(get_path(&t, "area[0].style[1]").unwrap().as_str(), Some("Local"));
        assert_eq!(get_path(&t, "config_version").unwrap().as_int(), Some(1));
        assert!(matches!(get_path(&t, "").unwrap(), ValueRef::Table(_)));
    }

    #[test]
    fn test_missing_segments_are_not_found() {
        let t = sample();
        for p in ["nope", "area[3].name", "area[0].style[9]", "system_name.x"] {
            let err = get_path(&t, p).unwrap_err();
            assert_eq!(err.status(), crate::error::Status::NotFound, "{}", p);
        }
        assert_eq!(
            get_path(&t, "area[x]").unwrap_err().status(),
            crate::error::Status::InvalidArgument
        );
    }

    #[test]
    fn test_set_creates_interior_tables() {
        let mut t = Table::new();
        set_path(&mut t, "general.session.charset", "chinese".into()).unwrap();
        assert_eq!(
            get_path(&t, "general.session.charset").unwrap().as_str(),
            Some("chinese")
        );
    }

    #[test]
    fn test_set_extends_table_and_string_lists() {
        let mut t = Table::new();
        set_path(&mut t, "area[2].name", "third".into()).unwrap();
        assert_eq!(get_path(&t, "area").unwrap().count(), Some(3));
        assert_eq!(get_path(&t, "area[0]").unwrap().count(), Some(0));

        set_path(&mut t, "tags[1]", "b".into()).unwrap();
        assert_eq!(
            get_path(&t, "tags").unwrap().as_str_list().unwrap(),
            &["".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_scalar_through_string_list_requires_string() {
        let mut t = sample();
        let err = set_path(&mut t, "area[0].style[0]", Value::Bool(true)).unwrap_err();
        assert_eq!(err.status(), crate::error::Status::InvalidArgument);
        set_path(&mut t, "area[0].style[0]", "*.MSG".into()).unwrap();
        assert_eq!(get_path(&t, "area[0].style[0]").unwrap().as_str(), Some("*.MSG"));
    }

    #[test]
    fn test_insert_preserves_position() {
        let mut t = Table::new();
        t.insert("a", Value::Int(1));
        t.insert("b", Value::Int(2));
        t.insert("a", Value::Int(3));
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(t.get("a"), Some(&Value::Int(3)));
    }
}
