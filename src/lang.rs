//! # Language catalog
//!
//! A language file is an ordinary TOML document whose top-level tables are
//! *heaps* of display strings:
//!
//! ```toml
//! [meta]
//! name = "English"
//!
//! [global]
//! press_enter = "Press |15ENTER|07 to continue"
//! yes = { text = "Yes", rip = "!|Yes", flags = ["Hotkey"] }
//!
//! [_legacy_map]
//! "0x0000" = "global.press_enter"
//! "0x0001" = "global.yes"
//! ```
//!
//! Strings are addressed as `heap.symbol`, or by the numeric id that older
//! callers still use through `[_legacy_map]`. Hosts can also register
//! runtime namespaces whose entries resolve as if they were heaps.

use std::path::Path;

use log::{debug, warn};

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::fsutil;
use crate::value::{self, Value, ValueRef};

/// Upper bound on legacy ids.
pub const MAX_LEGACY_IDS: usize = 2048;
/// Runtime namespaces a catalog can hold at once.
pub const MAX_NAMESPACES: usize = 32;
/// Entries per runtime namespace.
pub const MAX_NAMESPACE_KEYS: usize = 256;

const LEGACY_MAP: &str = "_legacy_map";

#[derive(Debug, Default)]
struct Namespace {
    name: String,
    entries: Vec<(String, String)>,
}

impl Namespace {
    fn lookup(&self, symbol: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == symbol)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
pub struct LangCatalog {
    doc: Document,
    legacy: Vec<Option<String>>,
    namespaces: Vec<Namespace>,
    use_rip: bool,
}

impl LangCatalog {
    /// Loads the language file at `path` and indexes its legacy map.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut doc = Document::new();
        doc.load_file(path.as_ref(), "")?;
        let mut cat = LangCatalog {
            doc,
            ..LangCatalog::default()
        };
        cat.index_legacy_map();
        Ok(cat)
    }

    /// Rebuilds the id table from `[_legacy_map]`. Keys are `0x`-prefixed
    /// hex ids; anything else, or a non-string target, is skipped.
    fn index_legacy_map(&mut self) {
        self.legacy.clear();
        let Ok(map) = self.doc.get_base(LEGACY_MAP) else {
            return;
        };
        let Some(table) = map.as_table() else {
            warn!("{} is a {}, not a table", LEGACY_MAP, map.type_name());
            return;
        };
        for (key, value) in table.iter() {
            let id = key
                .strip_prefix("0x")
                .or_else(|| key.strip_prefix("0X"))
                .and_then(|h| usize::from_str_radix(h, 16).ok());
            let (Some(id), Some(target)) = (id, value.as_ref().as_str()) else {
                debug!("skipping legacy map entry '{}'", key);
                continue;
            };
            if id >= MAX_LEGACY_IDS {
                debug!("legacy id {:#06x} beyond the table", id);
                continue;
            }
            if self.legacy.len() <= id {
                self.legacy.resize(id + 1, None);
            }
            self.legacy[id] = Some(target.to_string());
        }
        debug!("legacy map: {} ids", self.legacy.iter().flatten().count());
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn set_use_rip(&mut self, on: bool) {
        self.use_rip = on;
    }

    pub fn use_rip(&self) -> bool {
        self.use_rip
    }

    /// The string stored at `key` itself: a plain string, or the `text`
    /// member of an inline table.
    fn raw(&self, key: &str) -> Option<&str> {
        match self.doc.get(key).ok()? {
            ValueRef::Str(s) => Some(s),
            t @ ValueRef::Table(_) => t.get("text").ok()?.as_str(),
            _ => None,
        }
    }

    fn runtime(&self, key: &str) -> Option<&str> {
        let (ns, symbol) = key.split_once('.')?;
        self.namespaces
            .iter()
            .find(|n| n.name == ns)?
            .lookup(symbol)
    }

    /// Resolves `heap.symbol`. In RIP mode `<key>.rip` wins when present;
    /// registered namespaces are consulted after the file. Unknown keys
    /// yield `""`.
    pub fn get(&self, key: &str) -> &str {
        if self.use_rip {
            if let Some(s) = self.get_rip(key) {
                return s;
            }
        }
        self.raw(key)
            .or_else(|| self.runtime(key))
            .unwrap_or("")
    }

    /// The RIP alternate of `key`, if the file has one.
    pub fn get_rip(&self, key: &str) -> Option<&str> {
        self.doc.get(&format!("{}.rip", key)).ok()?.as_str()
    }

    /// True iff `<key>.flags` lists `flag`, ignoring case.
    pub fn has_flag(&self, key: &str, flag: &str) -> bool {
        self.doc
            .get(&format!("{}.flags", key))
            .ok()
            .and_then(|v| v.as_str_list())
            .is_some_and(|l| l.iter().any(|f| f.eq_ignore_ascii_case(flag)))
    }

    /// Dotted key behind legacy id `id`.
    pub fn legacy_key(&self, id: usize) -> Option<&str> {
        self.legacy.get(id)?.as_deref()
    }

    /// Resolves a legacy numeric id; `""` when the id is unmapped.
    pub fn get_by_id(&self, id: usize) -> &str {
        match self.legacy_key(id) {
            Some(key) => self.get(key),
            None => "",
        }
    }

    /// Resolves the `n`th id of `heap`, counting from the first id that
    /// maps into it.
    pub fn get_by_heap_id(&self, heap: &str, n: usize) -> &str {
        let base = self.legacy.iter().position(|k| {
            k.as_deref()
                .and_then(|k| k.strip_prefix(heap))
                .is_some_and(|rest| rest.starts_with('.'))
        });
        match base {
            Some(base) => self.get_by_id(base + n),
            None => "",
        }
    }

    /// Display name from `[meta]`.
    pub fn get_name(&self) -> &str {
        self.raw("meta.name").unwrap_or("")
    }

    /// Merges another language file. Each `[heap]` the file declares must
    /// be new; headers starting with `_` may repeat. Nothing is merged when
    /// a heap clashes. The file's legacy ids are added to the existing map.
    pub fn load_extension(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fsutil::read_text(path)?;
        for header in section_headers(&text) {
            if header.starts_with('_') {
                continue;
            }
            if self.doc.get(header).is_ok() {
                return Err(ConfigError::Duplicate(format!(
                    "{}: heap '{}' already loaded",
                    path.display(),
                    header
                )));
            }
        }
        let mut table = value::parse_str(&text, &path.display().to_string())?;
        let legacy = table.remove(LEGACY_MAP);
        self.doc.mount(table, "")?;
        if let Some(Value::Table(ids)) = legacy {
            self.doc.mount(ids, LEGACY_MAP)?;
        }
        debug!("language extension {} merged", path.display());
        self.index_legacy_map();
        Ok(())
    }

    /// Registers runtime strings visible as `ns.<key>`. Existing keys are
    /// replaced in place.
    pub fn register<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        ns: &str,
        keys: &[K],
        values: &[V],
    ) -> Result<()> {
        if ns.is_empty() || keys.is_empty() || keys.len() != values.len() {
            return Err(ConfigError::invalid("register needs a namespace and paired keys"));
        }
        let slot = match self.namespaces.iter().position(|n| n.name == ns) {
            Some(i) => i,
            None => {
                if self.namespaces.len() >= MAX_NAMESPACES {
                    return Err(ConfigError::OutOfMemory);
                }
                self.namespaces.push(Namespace {
                    name: ns.to_string(),
                    entries: Vec::new(),
                });
                self.namespaces.len() - 1
            }
        };
        let entries = &mut self.namespaces[slot].entries;
        for (k, v) in keys.iter().zip(values) {
            let (k, v) = (k.as_ref(), v.as_ref());
            if let Some(e) = entries.iter_mut().find(|(key, _)| key == k) {
                e.1 = v.to_string();
            } else if entries.len() >= MAX_NAMESPACE_KEYS {
                return Err(ConfigError::OutOfMemory);
            } else {
                entries.push((k.to_string(), v.to_string()));
            }
        }
        Ok(())
    }

    /// Drops a runtime namespace. `NotFound` if it was never registered.
    pub fn unregister(&mut self, ns: &str) -> Result<()> {
        let i = self
            .namespaces
            .iter()
            .position(|n| n.name == ns)
            .ok_or_else(|| ConfigError::not_found(ns))?;
        self.namespaces.remove(i);
        Ok(())
    }
}

/// `[name]` headers in `text`, trimmed; table-list headers are ignored.
fn section_headers(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter_map(|line| {
        let line = line.trim();
        if line.starts_with("[[") {
            return None;
        }
        let inner = line.strip_prefix('[')?;
        let end = inner.find(']')?;
        let name = inner[..end].trim();
        (!name.is_empty()).then_some(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    const ENGLISH: &str = r#"
[meta]
name = "English"

[global]
press_enter = "Press ENTER"
yes = { text = "Yes", rip = "!|Yes", flags = ["Hotkey", "NoCR"] }

[menu]
first = "First"
second = "Second"

[_legacy_map]
"0x0000" = "global.press_enter"
"0x0001" = "global.yes"
"0x0002" = "menu.first"
"0x0003" = "menu.second"
"0x0005" = 7
"#;

    fn catalog(dir: &Path) -> LangCatalog {
        let path = dir.join("english.toml");
        std::fs::write(&path, ENGLISH).unwrap();
        LangCatalog::open(&path).unwrap()
    }

    #[test]
    fn test_get_plain_and_inline() {
        let dir = tempfile::tempdir().unwrap();
        let cat = catalog(dir.path());
        assert_eq!(cat.get_name(), "English");
        assert_eq!(cat.get("global.press_enter"), "Press ENTER");
        assert_eq!(cat.get("global.yes"), "Yes");
        assert_eq!(cat.get("global.nope"), "");
    }

    #[test]
    fn test_rip_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = catalog(dir.path());
        assert_eq!(cat.get_rip("global.yes"), Some("!|Yes"));
        assert_eq!(cat.get_rip("global.press_enter"), None);
        cat.set_use_rip(true);
        assert_eq!(cat.get("global.yes"), "!|Yes");
        assert_eq!(cat.get("global.press_enter"), "Press ENTER");
    }

    #[test]
    fn test_flags() {
        let dir = tempfile::tempdir().unwrap();
        let cat = catalog(dir.path());
        assert!(cat.has_flag("global.yes", "hotkey"));
        assert!(!cat.has_flag("global.yes", "Bold"));
        assert!(!cat.has_flag("global.press_enter", "Hotkey"));
    }

    #[test]
    fn test_legacy_ids() {
        let dir = tempfile::tempdir().unwrap();
        let cat = catalog(dir.path());
        assert_eq!(cat.get_by_id(0), "Press ENTER");
        assert_eq!(cat.get_by_id(3), "Second");
        assert_eq!(cat.get_by_id(5), "");
        assert_eq!(cat.get_by_id(4000), "");
        assert_eq!(cat.get_by_heap_id("menu", 1), "Second");
        assert_eq!(cat.get_by_heap_id("men", 0), "");
    }

    #[test]
    fn test_runtime_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = catalog(dir.path());
        cat.register("door", &["title", "exit"], &["Doors", "Bye"]).unwrap();
        assert_eq!(cat.get("door.title"), "Doors");
        cat.register("door", &["title"], &["Door Games"]).unwrap();
        assert_eq!(cat.get("door.title"), "Door Games");
        assert_eq!(cat.get("door.exit"), "Bye");

        let empty: [&str; 0] = [];
        let err = cat.register("door", &empty, &empty).unwrap_err();
        assert_eq!(err.status(), Status::InvalidArgument);

        cat.unregister("door").unwrap();
        assert_eq!(cat.get("door.title"), "");
        assert_eq!(cat.unregister("door").unwrap_err().status(), Status::NotFound);
    }

    #[test]
    fn test_namespace_limits() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = catalog(dir.path());
        for i in 0..MAX_NAMESPACES {
            cat.register(&format!("ns{}", i), &["k"], &["v"]).unwrap();
        }
        let err = cat.register("extra", &["k"], &["v"]).unwrap_err();
        assert_eq!(err.status(), Status::OutOfMemory);

        let keys: Vec<String> = (0..=MAX_NAMESPACE_KEYS).map(|i| format!("k{}", i)).collect();
        let err = cat.register("ns0", &keys, &keys).unwrap_err();
        assert_eq!(err.status(), Status::OutOfMemory);
    }

    #[test]
    fn test_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = catalog(dir.path());

        let ext = dir.path().join("ext.toml");
        std::fs::write(&ext, "[doors]\nmenu = \"Doors\"\n[_legacy_map]\n\"0x0004\" = \"doors.menu\"\n").unwrap();
        cat.load_extension(&ext).unwrap();
        assert_eq!(cat.get("doors.menu"), "Doors");
        assert_eq!(cat.get_by_id(4), "Doors");
        assert_eq!(cat.get_by_id(0), "Press ENTER");

        let clash = dir.path().join("clash.toml");
        std::fs::write(&clash, "[ menu ]\nfirst = \"Other\"\n").unwrap();
        let err = cat.load_extension(&clash).unwrap_err();
        assert_eq!(err.status(), Status::Duplicate);
        assert_eq!(cat.get("menu.first"), "First");

        let missing = cat.load_extension(dir.path().join("nope.toml")).unwrap_err();
        assert_eq!(missing.status(), Status::NotFound);
    }
}
