//! `general/language.toml`: installed language files and heap sizing.

use crate::document::Document;
use crate::error::Result;

use super::{Fields, TomlWriter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Language {
    pub max_lang: i32,
    pub lang_files: Vec<String>,
    pub max_ptrs: i32,
    pub max_heap: i32,
    pub max_glh_ptrs: i32,
    pub max_glh_len: i32,
    pub max_syh_ptrs: i32,
    pub max_syh_len: i32,
}

impl Language {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        Ok(Self {
            max_lang: f.int("max_lang", 0)?,
            lang_files: f.str_list("lang_file")?,
            max_ptrs: f.int("max_ptrs", 0)?,
            max_heap: f.int("max_heap", 0)?,
            max_glh_ptrs: f.int("max_glh_ptrs", 0)?,
            max_glh_len: f.int("max_glh_len", 0)?,
            max_syh_ptrs: f.int("max_syh_ptrs", 0)?,
            max_syh_len: f.int("max_syh_len", 0)?,
        })
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.int("max_lang", self.max_lang.into())
            .str_list("lang_file", &self.lang_files);
        // sizing hints are omitted when unset
        for (key, v) in [
            ("max_ptrs", self.max_ptrs),
            ("max_heap", self.max_heap),
            ("max_glh_ptrs", self.max_glh_ptrs),
            ("max_glh_len", self.max_glh_len),
            ("max_syh_ptrs", self.max_syh_ptrs),
            ("max_syh_len", self.max_syh_len),
        ] {
            if v != 0 {
                w.int(key, v.into());
            }
        }
        w.finish()
    }
}
