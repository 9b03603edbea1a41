//! `general/protocol.toml`: external file transfer protocols.

use crate::document::Document;
use crate::error::Result;

use super::{Fields, TomlWriter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Protocol {
    pub index: i32,
    pub name: String,
    pub program: String,
    pub batch: bool,
    pub exitlevel: bool,
    pub opus: bool,
    pub bi: bool,
    pub log_file: String,
    pub control_file: String,
    pub download_cmd: String,
    pub upload_cmd: String,
    pub download_string: String,
    pub upload_string: String,
    pub download_keyword: String,
    pub upload_keyword: String,
    pub filename_word: i32,
    pub descript_word: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolList {
    pub protoexit: i32,
    pub protocol_max_path: String,
    pub protocol_max_exists: bool,
    pub protocol_ctl_path: String,
    pub protocol_ctl_exists: bool,
    pub protocols: Vec<Protocol>,
}

impl Protocol {
    fn read(f: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            index: f.int("index", 0)?,
            name: f.str("name")?,
            program: f.str("program")?,
            batch: f.bool("batch", false)?,
            exitlevel: f.bool("exitlevel", false)?,
            opus: f.bool("opus", false)?,
            bi: f.bool("bi", false)?,
            log_file: f.str("log_file")?,
            control_file: f.str("control_file")?,
            download_cmd: f.str("download_cmd")?,
            upload_cmd: f.str("upload_cmd")?,
            download_string: f.str("download_string")?,
            upload_string: f.str("upload_string")?,
            download_keyword: f.str("download_keyword")?,
            upload_keyword: f.str("upload_keyword")?,
            filename_word: f.int("filename_word", 0)?,
            descript_word: f.int("descript_word", 0)?,
        })
    }

    fn write(&self, w: &mut TomlWriter) {
        w.list_entry("protocol")
            .int("index", self.index.into())
            .str("name", &self.name)
            .str("program", &self.program)
            .bool("batch", self.batch)
            .bool("exitlevel", self.exitlevel)
            .bool("opus", self.opus)
            .bool("bi", self.bi)
            .str("log_file", &self.log_file)
            .str("control_file", &self.control_file)
            .str("download_cmd", &self.download_cmd)
            .str("upload_cmd", &self.upload_cmd)
            .str("download_string", &self.download_string)
            .str("upload_string", &self.upload_string)
            .str("download_keyword", &self.download_keyword)
            .str("upload_keyword", &self.upload_keyword)
            .int("filename_word", self.filename_word.into())
            .int("descript_word", self.descript_word.into());
    }
}

impl ProtocolList {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        let protocols = f
            .table_list("protocol")?
            .iter()
            .map(Protocol::read)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            protoexit: f.int("protoexit", 0)?,
            protocol_max_path: f.str("protocol_max_path")?,
            protocol_max_exists: f.bool("protocol_max_exists", false)?,
            protocol_ctl_path: f.str("protocol_ctl_path")?,
            protocol_ctl_exists: f.bool("protocol_ctl_exists", false)?,
            protocols,
        })
    }

    pub fn find(&self, name: &str) -> Option<&Protocol> {
        self.protocols.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.int("protoexit", self.protoexit.into())
            .str("protocol_max_path", &self.protocol_max_path)
            .bool("protocol_max_exists", self.protocol_max_exists)
            .str("protocol_ctl_path", &self.protocol_ctl_path)
            .bool("protocol_ctl_exists", self.protocol_ctl_exists);
        for p in &self.protocols {
            p.write(&mut w);
        }
        w.finish()
    }
}
