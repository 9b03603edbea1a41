//! External protocols: `etc/protocol.ctl` and the packed `protocol.max`.
//!
//! ## protocol.max
//!
//! A flat array of fixed-size little-endian records, record `i` describing
//! the `i`-th `Protocol` block of the text file:
//!
//! | offset | size | field |
//! |-------:|-----:|-------|
//! | 0      | 2    | flag word |
//! | 2      | 40   | description |
//! | 42     | 4 × 120 | log, control, download command, upload command |
//! | 522    | 4 × 40  | download/upload string, download/upload keyword |
//! | 682    | 2    | file name word index |
//! | 684    | 2    | description word index |
//!
//! Strings are NUL-padded. When both files exist the text wins for names
//! and commands while the record supplies flags and word indices.

use std::path::Path;

use bitflags::bitflags;
use log::{debug, warn};

use crate::error::Result;
use crate::fsutil;
use crate::logutil::{escape_log, escape_log_bytes};
use crate::schema::enums::atoi;
use crate::schema::{Protocol, ProtocolList};

use super::{split_word, trim};

pub const PATH_LEN: usize = 120;
const DESC_LEN: usize = 40;
const STR_LEN: usize = 40;
pub const PROTOCOL_RECORD_LEN: usize = 2 + DESC_LEN + 4 * PATH_LEN + 4 * STR_LEN + 2 + 2;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProtocolFlags: u16 {
        const BATCH = 0x02;
        const OPUS = 0x04;
        const EXITLEVEL = 0x08;
        const BI = 0x10;
    }
}

/// One decoded `protocol.max` record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolRecord {
    pub flag: u16,
    pub description: String,
    pub log: String,
    pub ctl: String,
    pub download_cmd: String,
    pub upload_cmd: String,
    pub download_string: String,
    pub upload_string: String,
    pub download_keyword: String,
    pub upload_keyword: String,
    pub filename_word: u16,
    pub descript_word: u16,
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        s
    }

    fn u16(&mut self) -> u16 {
        let b = self.take(2);
        u16::from_le_bytes([b[0], b[1]])
    }

    fn string(&mut self, n: usize) -> String {
        c_string(self.take(n))
    }
}

fn put_string(out: &mut Vec<u8>, s: &str, width: usize) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(width - 1);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + width - n, 0);
}

impl ProtocolRecord {
    /// Decodes one record; `None` if `buf` is shorter than a record.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < PROTOCOL_RECORD_LEN {
            return None;
        }
        let mut c = Cursor { buf, pos: 0 };
        Some(Self {
            flag: c.u16(),
            description: c.string(DESC_LEN),
            log: c.string(PATH_LEN),
            ctl: c.string(PATH_LEN),
            download_cmd: c.string(PATH_LEN),
            upload_cmd: c.string(PATH_LEN),
            download_string: c.string(STR_LEN),
            upload_string: c.string(STR_LEN),
            download_keyword: c.string(STR_LEN),
            upload_keyword: c.string(STR_LEN),
            filename_word: c.u16(),
            descript_word: c.u16(),
        })
    }

    /// Packs the record, truncating strings to leave room for the NUL.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PROTOCOL_RECORD_LEN);
        out.extend_from_slice(&self.flag.to_le_bytes());
        put_string(&mut out, &self.description, DESC_LEN);
        for s in [&self.log, &self.ctl, &self.download_cmd, &self.upload_cmd] {
            put_string(&mut out, s, PATH_LEN);
        }
        for s in [
            &self.download_string,
            &self.upload_string,
            &self.download_keyword,
            &self.upload_keyword,
        ] {
            put_string(&mut out, s, STR_LEN);
        }
        out.extend_from_slice(&self.filename_word.to_le_bytes());
        out.extend_from_slice(&self.descript_word.to_le_bytes());
        out
    }

    pub fn flags(&self) -> ProtocolFlags {
        ProtocolFlags::from_bits_truncate(self.flag)
    }

    /// An all-zero slot: no flags and no description.
    pub fn is_absent(&self) -> bool {
        self.flag == 0 && self.description.is_empty()
    }

    fn to_protocol(&self, index: i32) -> Protocol {
        let mut p = Protocol {
            index,
            ..Protocol::default()
        };
        self.merge_into(&mut p);
        p
    }

    /// Fills the empty text fields of `p` and adds flags and word indices.
    fn merge_into(&self, p: &mut Protocol) {
        for (dst, src) in [
            (&mut p.name, &self.description),
            (&mut p.log_file, &self.log),
            (&mut p.control_file, &self.ctl),
            (&mut p.download_cmd, &self.download_cmd),
            (&mut p.upload_cmd, &self.upload_cmd),
            (&mut p.download_string, &self.download_string),
            (&mut p.upload_string, &self.upload_string),
            (&mut p.download_keyword, &self.download_keyword),
            (&mut p.upload_keyword, &self.upload_keyword),
        ] {
            if dst.is_empty() {
                dst.clone_from(src);
            }
        }
        let f = self.flags();
        p.batch |= f.contains(ProtocolFlags::BATCH);
        p.opus |= f.contains(ProtocolFlags::OPUS);
        p.exitlevel |= f.contains(ProtocolFlags::EXITLEVEL);
        p.bi |= f.contains(ProtocolFlags::BI);
        p.filename_word = self.filename_word.into();
        p.descript_word = self.descript_word.into();
    }
}

/// Every slot of a `protocol.max` image, `None` where a slot is absent.
pub fn decode_protocol_max(source: &str, data: &[u8]) -> Vec<Option<ProtocolRecord>> {
    let chunks = data.chunks_exact(PROTOCOL_RECORD_LEN);
    if !chunks.remainder().is_empty() {
        warn!(
            "{}: ignoring {} trailing bytes ('{}')",
            source,
            chunks.remainder().len(),
            escape_log_bytes(chunks.remainder())
        );
    }
    chunks
        .enumerate()
        .map(|(i, chunk)| {
            let rec = ProtocolRecord::decode(chunk)?;
            if rec.is_absent() {
                return None;
            }
            if rec.flag == 0 {
                warn!(
                    "{}: record {} ('{}') has no flags set, keeping it",
                    source,
                    i,
                    escape_log(&rec.description)
                );
            }
            Some(rec)
        })
        .collect()
}

/// `"kw ""quoted"" text"` loses its outer quotes; doubled quotes collapse.
/// Unquoted values pass through.
fn unquote(v: &str) -> String {
    let Some(body) = v.strip_prefix('"') else {
        return v.to_string();
    };
    let mut out = String::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                out.push('"');
                continue;
            }
            break;
        }
        out.push(c);
    }
    out
}

/// Protocol blocks of a `protocol.ctl` text, indexed in file order.
pub fn read_protocol_ctl(text: &str) -> Vec<Protocol> {
    let mut out = Vec::new();
    let mut cur: Option<Protocol> = None;

    for raw in text.lines() {
        let line = trim(raw);
        if line.is_empty() || line.starts_with(';') || line.starts_with('%') {
            continue;
        }
        let line = match line.split_once(';') {
            Some((head, _)) => trim(head),
            None => line,
        };
        if line.is_empty() {
            continue;
        }
        let (key, rest) = split_word(line);
        let key = key.to_ascii_lowercase();

        if key == "protocol" {
            cur = Some(Protocol {
                index: i32::try_from(out.len()).unwrap_or(i32::MAX),
                name: rest.to_string(),
                ..Protocol::default()
            });
            continue;
        }
        let Some(p) = cur.as_mut() else {
            continue;
        };
        let (word, _) = split_word(rest);
        match key.as_str() {
            "end" => out.extend(cur.take()),
            "logfile" => p.log_file = word.to_string(),
            "controlfile" => p.control_file = word.to_string(),
            "downloadcmd" => p.download_cmd = rest.to_string(),
            "uploadcmd" => p.upload_cmd = rest.to_string(),
            "downloadstring" => p.download_string = rest.to_string(),
            "uploadstring" => p.upload_string = rest.to_string(),
            "downloadkeyword" => p.download_keyword = unquote(rest),
            "uploadkeyword" => p.upload_keyword = unquote(rest),
            "filenameword" => p.filename_word = atoi(word),
            "descriptword" => p.descript_word = atoi(word),
            "type" => match word.to_ascii_lowercase().as_str() {
                "batch" => p.batch = true,
                "bi" => p.bi = true,
                "opus" => p.opus = true,
                "errorlevel" => p.exitlevel = true,
                _ => {}
            },
            _ => {}
        }
    }
    out
}

/// Combines the text blocks with the binary slots of the same index. With
/// no text blocks at all the present binary records stand on their own.
pub fn merge_protocols(
    text: Vec<Protocol>,
    records: &[Option<ProtocolRecord>],
) -> Vec<Protocol> {
    if text.is_empty() {
        return records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| Some(r.as_ref()?.to_protocol(i32::try_from(i).ok()?)))
            .collect();
    }
    text.into_iter()
        .map(|mut p| {
            let rec = usize::try_from(p.index)
                .ok()
                .and_then(|i| records.get(i))
                .and_then(Option::as_ref);
            if let Some(rec) = rec {
                rec.merge_into(&mut p);
            }
            p
        })
        .collect()
}

/// The protocol list of the install under `sys_dir`. `protoexit` comes
/// from `max.ctl`.
pub fn parse_protocols(sys_dir: &Path, protoexit: i32) -> Result<ProtocolList> {
    let max_path = sys_dir.join("protocol.max");
    let ctl_path = sys_dir.join("etc").join("protocol.ctl");

    let protocol_max_exists = max_path.is_file();
    let records = if protocol_max_exists {
        let data = std::fs::read(&max_path)?;
        debug!("reading {} ({} bytes)", max_path.display(), data.len());
        decode_protocol_max(&max_path.display().to_string(), &data)
    } else {
        Vec::new()
    };
    let text = match fsutil::read_text_opt(&ctl_path)? {
        Some(t) => read_protocol_ctl(&t),
        None => Vec::new(),
    };

    let protocols = merge_protocols(text, &records);
    debug!("{} protocols", protocols.len());
    Ok(ProtocolList {
        protoexit,
        protocol_max_path: max_path.display().to_string(),
        protocol_max_exists,
        protocol_ctl_path: ctl_path.display().to_string(),
        protocol_ctl_exists: !protocols.is_empty(),
        protocols,
    })
}
