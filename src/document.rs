//! # Configuration document
//!
//! A [`Document`] owns the merged base tree built from one or more TOML
//! files, the list of `(path, prefix)` records describing where each file
//! was mounted, and a flat *override* map consulted before the base tree.
//!
//! ## Overrides
//!
//! Setters never touch the base tree. An override becomes part of the base
//! tree only through [`Document::persist_one`] / [`Document::persist_all`];
//! until then [`Document::clear_all`] discards it without trace.
//!
//! ## Saving
//!
//! [`Document::save_prefix`] writes the subtree of one mounted file through
//! a `.tmp` sibling and a rename. Cross-file atomicity is the exporter's job
//! (see [`crate::export`]).
//!
//! ```rust,no_run
//! use maxcfg::document::Document;
//!
//! # fn main() -> maxcfg::error::Result<()> {
//! let mut doc = Document::new();
//! doc.load_file("config/maximus.toml", "maximus")?;
//! doc.set_string("maximus.system_name", "Night Owl")?;
//! doc.persist_and_save("maximus.system_name")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ConfigError, Result};
use crate::fsutil;
use crate::value::{self, emit_table, get_path, set_path, split_path, Table, Value, ValueRef};

/// Where a file was loaded from and the prefix it was mounted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub prefix: String,
}

#[derive(Debug, Default)]
pub struct Document {
    root: Table,
    overrides: BTreeMap<String, Value>,
    loaded: Vec<LoadedFile>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base tree, without overrides.
    pub fn base(&self) -> &Table {
        &self.root
    }

    pub fn loaded_files(&self) -> &[LoadedFile] {
        &self.loaded
    }

    /// Pending overrides in persist order.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parses `path` and merges its top-level keys into the table at
    /// `prefix`. When `path` is missing and has no `.toml` extension, the
    /// `.toml` variant is tried; the record keeps whichever path loaded.
    pub fn load_file(&mut self, path: impl AsRef<Path>, prefix: &str) -> Result<()> {
        let path = path.as_ref();
        let (used, table) = match value::parse_file(path) {
            Ok(t) => (path.to_path_buf(), t),
            Err(ConfigError::NotFound(_)) if !has_toml_ext(path) => {
                let alt = fsutil::with_suffix(path, ".toml");
                let t = value::parse_file(&alt)?;
                (alt, t)
            }
            Err(e) => return Err(e),
        };
        self.mount(table, prefix)?;
        debug!("loaded {} under '{}'", used.display(), prefix);
        self.loaded.push(LoadedFile {
            path: used,
            prefix: prefix.to_string(),
        });
        Ok(())
    }

    /// Merges an already-parsed table at `prefix` without recording a
    /// source file.
    pub fn mount(&mut self, table: Table, prefix: &str) -> Result<()> {
        let mut dst = &mut self.root;
        for seg in split_path(prefix)? {
            if seg.index.is_some() {
                return Err(ConfigError::invalid(format!("indexed mount prefix '{}'", prefix)));
            }
            dst = dst.table_mut(seg.name)?;
        }
        dst.merge(table);
        Ok(())
    }

    /// Reads `path`, preferring a pending override over the base tree.
    pub fn get(&self, path: &str) -> Result<ValueRef<'_>> {
        if let Some(v) = self.overrides.get(path) {
            return Ok(v.as_ref());
        }
        get_path(&self.root, path)
    }

    /// Reads `path` from the base tree only.
    pub fn get_base(&self, path: &str) -> Result<ValueRef<'_>> {
        get_path(&self.root, path)
    }

    fn set_override(&mut self, path: &str, value: Value) -> Result<()> {
        if split_path(path)?.is_empty() {
            return Err(ConfigError::invalid("empty override path"));
        }
        self.overrides.insert(path.to_string(), value);
        Ok(())
    }

    pub fn set_int(&mut self, path: &str, v: i64) -> Result<()> {
        self.set_override(path, Value::Int(v))
    }

    pub fn set_uint(&mut self, path: &str, v: u64) -> Result<()> {
        self.set_override(path, Value::Uint(v))
    }

    pub fn set_bool(&mut self, path: &str, v: bool) -> Result<()> {
        self.set_override(path, Value::Bool(v))
    }

    pub fn set_string(&mut self, path: &str, v: &str) -> Result<()> {
        self.set_override(path, Value::Str(v.to_string()))
    }

    pub fn set_string_list<S: AsRef<str>>(&mut self, path: &str, items: &[S]) -> Result<()> {
        let list = items.iter().map(|s| s.as_ref().to_string()).collect();
        self.set_override(path, Value::StrList(list))
    }

    pub fn set_empty_table_list(&mut self, path: &str) -> Result<()> {
        self.set_override(path, Value::TableList(Vec::new()))
    }

    /// Drops one override. `NotFound` when nothing was pending at `path`.
    pub fn unset(&mut self, path: &str) -> Result<()> {
        self.overrides
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| ConfigError::not_found(path))
    }

    pub fn clear_all(&mut self) {
        self.overrides.clear();
    }

    /// Installs the override at `path` into the base tree and drops it.
    /// On failure the override stays pending.
    pub fn persist_one(&mut self, path: &str) -> Result<()> {
        let value = self
            .overrides
            .get(path)
            .cloned()
            .ok_or_else(|| ConfigError::not_found(path))?;
        set_path(&mut self.root, path, value)?;
        self.overrides.remove(path);
        Ok(())
    }

    /// Persists every override in ascending path order. The scan repeats if
    /// overrides remain, bounded by the number pending at the start.
    pub fn persist_all(&mut self) -> Result<()> {
        let rounds = self.overrides.len();
        for _ in 0..=rounds {
            if self.overrides.is_empty() {
                break;
            }
            let keys: Vec<String> = self.overrides.keys().cloned().collect();
            for k in keys {
                if self.overrides.contains_key(&k) {
                    self.persist_one(&k)?;
                }
            }
        }
        Ok(())
    }

    /// Persists `path` and rewrites the loaded file whose non-empty prefix
    /// is the longest match for it.
    pub fn persist_and_save(&mut self, path: &str) -> Result<()> {
        self.persist_one(path)?;
        let best = self
            .best_file_for(path)
            .cloned()
            .ok_or_else(|| ConfigError::not_found(format!("no loaded file for '{}'", path)))?;
        self.write_prefix(&best.prefix, &best.path)
    }

    pub fn persist_all_and_save(&mut self) -> Result<()> {
        self.persist_all()?;
        self.save_all()
    }

    /// Loaded file with the longest non-empty prefix that equals `path` or
    /// is a dotted ancestor of it.
    pub fn best_file_for(&self, path: &str) -> Option<&LoadedFile> {
        self.loaded
            .iter()
            .filter(|lf| {
                let p = lf.prefix.as_str();
                !p.is_empty()
                    && path.starts_with(p)
                    && matches!(path.as_bytes().get(p.len()), None | Some(b'.'))
            })
            .max_by_key(|lf| lf.prefix.len())
    }

    /// Writes the subtree of the first file loaded under `prefix`.
    pub fn save_prefix(&self, prefix: &str) -> Result<()> {
        let lf = self
            .loaded
            .iter()
            .find(|lf| lf.prefix == prefix)
            .ok_or_else(|| ConfigError::not_found(format!("no file loaded under '{}'", prefix)))?;
        self.write_prefix(prefix, &lf.path)
    }

    /// Writes every loaded file in load order; stops at the first failure.
    pub fn save_all(&self) -> Result<()> {
        if self.loaded.is_empty() {
            return Err(ConfigError::not_found("no loaded files"));
        }
        for lf in &self.loaded {
            self.write_prefix(&lf.prefix, &lf.path)?;
        }
        Ok(())
    }

    fn write_prefix(&self, prefix: &str, path: &Path) -> Result<()> {
        let table = get_path(&self.root, prefix)?
            .as_table()
            .ok_or_else(|| ConfigError::not_found(format!("'{}' is not a table", prefix)))?;
        fsutil::write_atomic(path, &emit_table(table))
    }
}

fn has_toml_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    fn doc_with(text: &str, prefix: &str) -> (tempfile::TempDir, Document) {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("file.toml");
        std::fs::write(&p, text).unwrap();
        let mut doc = Document::new();
        doc.load_file(&p, prefix).unwrap();
        (dir, doc)
    }

    #[test]
    fn test_override_isolation() {
        let (_d, mut doc) = doc_with("name = \"base\"\n", "sys");
        doc.set_string("sys.name", "over").unwrap();
        assert_eq!(doc.get("sys.name").unwrap().as_str(), Some("over"));
        assert_eq!(doc.get_base("sys.name").unwrap().as_str(), Some("base"));
        doc.clear_all();
        assert_eq!(doc.get("sys.name").unwrap().as_str(), Some("base"));

        doc.set_int("sys.fresh", 5).unwrap();
        doc.clear_all();
        assert_eq!(doc.get("sys.fresh").unwrap_err().status(), Status::NotFound);
    }

    #[test]
    fn test_persist_is_idempotent() {
        let (_d, mut doc) = doc_with("name = \"base\"\n", "sys");
        doc.set_string("sys.name", "new").unwrap();
        doc.persist_one("sys.name").unwrap();
        let once = doc.base().clone();
        assert_eq!(doc.persist_one("sys.name").unwrap_err().status(), Status::NotFound);
        assert_eq!(doc.base(), &once);
        assert_eq!(doc.get_base("sys.name").unwrap().as_str(), Some("new"));
    }

    #[test]
    fn test_failed_persist_keeps_override() {
        let (_d, mut doc) = doc_with("name = \"base\"\n", "sys");
        doc.set_bool("sys.name.deeper", true).unwrap();
        assert!(doc.persist_one("sys.name.deeper").is_err());
        assert_eq!(doc.overrides().count(), 1);
    }

    #[test]
    fn test_persist_all_sorted() {
        let mut doc = Document::new();
        doc.set_string("b.x", "2").unwrap();
        doc.set_string("a.x", "1").unwrap();
        doc.set_empty_table_list("c.list").unwrap();
        doc.persist_all().unwrap();
        assert_eq!(doc.base().keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(doc.overrides().count(), 0);
    }

    #[test]
    fn test_missing_file_retries_toml_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("maximus.toml"), "task_num = 3\n").unwrap();
        let mut doc = Document::new();
        doc.load_file(dir.path().join("maximus"), "maximus").unwrap();
        assert_eq!(doc.get("maximus.task_num").unwrap().as_int(), Some(3));
        assert!(doc.loaded_files()[0].path.ends_with("maximus.toml"));
    }

    #[test]
    fn test_best_file_is_longest_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("general.toml");
        let b = dir.path().join("session.toml");
        std::fs::write(&a, "x = 1\n").unwrap();
        std::fs::write(&b, "charset = \"cp437\"\n").unwrap();
        let mut doc = Document::new();
        doc.load_file(&a, "general").unwrap();
        doc.load_file(&b, "general.session").unwrap();

        assert_eq!(
            doc.best_file_for("general.session.charset").unwrap().path,
            b
        );
        assert_eq!(doc.best_file_for("general.sessionx").unwrap().path, a);

        doc.set_string("general.session.charset", "chinese").unwrap();
        doc.persist_and_save("general.session.charset").unwrap();
        let written = std::fs::read_to_string(&b).unwrap();
        assert_eq!(written, "charset = \"chinese\"\n");
    }
}
