//! `general/reader.toml`: offline mail reader packing.

use crate::document::Document;
use crate::error::Result;

use super::{Fields, TomlWriter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reader {
    pub max_pack: i32,
    pub archivers_ctl: String,
    pub packet_name: String,
    pub work_directory: String,
    pub phone: String,
}

impl Reader {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        Ok(Self {
            max_pack: f.int("max_pack", 0)?,
            archivers_ctl: f.str("archivers_ctl")?,
            packet_name: f.str("packet_name")?,
            work_directory: f.str("work_directory")?,
            phone: f.str("phone")?,
        })
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.int("max_pack", self.max_pack.into())
            .str("archivers_ctl", &self.archivers_ctl)
            .str("packet_name", &self.packet_name)
            .str("work_directory", &self.work_directory)
            .str("phone", &self.phone);
        w.finish()
    }
}
