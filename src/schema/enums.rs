//! Name <-> code conversions for enumerated settings, plus the document-level
//! lookups that decode them straight from `maximus.*`, `general.*` and
//! `matrix.*`.

use bitflags::bitflags;

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::value::ValueRef;

/// C-style `atoi`: optional whitespace and sign, then leading digits.
/// Anything unparsable yields 0.
pub fn atoi(s: &str) -> i32 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        n = (n * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    let n = if neg { -n } else { n };
    n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    Dos = 0,
    Fossil = 1,
    Ibm = 2,
    Fast = 3,
    Bios = 4,
}

impl VideoMode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            VideoMode::Dos => "dos",
            VideoMode::Fossil => "fossil",
            VideoMode::Ibm => "ibm",
            VideoMode::Fast => "fast",
            VideoMode::Bios => "bios",
        }
    }
}

/// Parses a video mode name. `ibm/snow` selects IBM and reports snow.
pub fn parse_video_mode(s: &str) -> Result<(VideoMode, bool)> {
    let s = s.trim();
    let mode = match s.to_ascii_lowercase().as_str() {
        "bios" => VideoMode::Bios,
        "ibm" => VideoMode::Ibm,
        "ibm/snow" => return Ok((VideoMode::Ibm, true)),
        "dos" => VideoMode::Dos,
        "fast" => VideoMode::Fast,
        "fossil" => VideoMode::Fossil,
        _ => return Err(ConfigError::invalid(format!("unknown video mode '{}'", s))),
    };
    Ok((mode, false))
}

pub const LOG_TERSE: i32 = 2;
pub const LOG_VERBOSE: i32 = 4;
pub const LOG_TRACE: i32 = 6;

/// `terse` / `verbose` / `trace`, or a number.
pub fn parse_log_mode(s: &str) -> Result<i32> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "terse" => Ok(LOG_TERSE),
        "verbose" => Ok(LOG_VERBOSE),
        "trace" => Ok(LOG_TRACE),
        _ if s.starts_with(|c: char| c.is_ascii_digit()) => Ok(atoi(s)),
        _ => Err(ConfigError::invalid(format!("unknown log mode '{}'", s))),
    }
}

pub fn log_mode_name(mode: i32) -> Option<&'static str> {
    match mode {
        LOG_TERSE => Some("terse"),
        LOG_VERBOSE => Some("verbose"),
        LOG_TRACE => Some("trace"),
        _ => None,
    }
}

pub const MULTITASKER_AUTO: i32 = -1;
pub const MULTITASKER_NONE: i32 = 0;
pub const MULTITASKER_DOUBLEDOS: i32 = 1;
pub const MULTITASKER_DESQVIEW: i32 = 2;
pub const MULTITASKER_TOPVIEW: i32 = 3;
pub const MULTITASKER_MLINK: i32 = 4;
pub const MULTITASKER_MSWINDOWS: i32 = 5;
pub const MULTITASKER_OS2: i32 = 6;
pub const MULTITASKER_PCMOS: i32 = 7;
pub const MULTITASKER_NT: i32 = 8;
pub const MULTITASKER_UNIX: i32 = 9;

pub fn parse_multitasker(s: &str) -> Result<i32> {
    let s = s.trim();
    let code = match s.to_ascii_lowercase().as_str() {
        "none" => MULTITASKER_NONE,
        "auto" => MULTITASKER_AUTO,
        "doubledos" => MULTITASKER_DOUBLEDOS,
        "desqview" => MULTITASKER_DESQVIEW,
        "topview" => MULTITASKER_TOPVIEW,
        "multilink" | "mlink" => MULTITASKER_MLINK,
        "mswindows" => MULTITASKER_MSWINDOWS,
        "pc-mos" | "pcmos" => MULTITASKER_PCMOS,
        "os/2" | "os2" => MULTITASKER_OS2,
        "nt" => MULTITASKER_NT,
        "unix" => MULTITASKER_UNIX,
        _ => {
            let b = s.as_bytes();
            let numeric = match b.first() {
                Some(c) if c.is_ascii_digit() => true,
                Some(b'-') => b.get(1).is_some_and(u8::is_ascii_digit),
                _ => false,
            };
            if !numeric {
                return Err(ConfigError::invalid(format!("unknown multitasker '{}'", s)));
            }
            atoi(s)
        }
    };
    Ok(code)
}

pub fn multitasker_name(code: i32) -> Option<&'static str> {
    Some(match code {
        MULTITASKER_AUTO => "auto",
        MULTITASKER_NONE => "none",
        MULTITASKER_DOUBLEDOS => "doubledos",
        MULTITASKER_DESQVIEW => "desqview",
        MULTITASKER_TOPVIEW => "topview",
        MULTITASKER_MLINK => "multilink",
        MULTITASKER_MSWINDOWS => "mswindows",
        MULTITASKER_OS2 => "os/2",
        MULTITASKER_PCMOS => "pc-mos",
        MULTITASKER_NT => "nt",
        MULTITASKER_UNIX => "unix",
        _ => return None,
    })
}

bitflags! {
    /// Serial flow-control bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Handshake: u8 {
        const XON = 0x01;
        const CTS = 0x02;
        const DSR = 0x04;
    }
}

pub fn parse_handshaking_token(s: &str) -> Result<Handshake> {
    match s.trim().to_ascii_lowercase().as_str() {
        "xon" => Ok(Handshake::XON),
        "cts" => Ok(Handshake::CTS),
        "dsr" => Ok(Handshake::DSR),
        _ => Err(ConfigError::invalid(format!("unknown handshaking token '{}'", s))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    None = 0,
    Swedish = 1,
    Chinese = 2,
}

impl Charset {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Charset::None => "",
            Charset::Swedish => "swedish",
            Charset::Chinese => "chinese",
        }
    }
}

/// Returns the charset and the `global_high_bit` side effect (set for
/// chinese only).
pub fn parse_charset(s: &str) -> Result<(Charset, bool)> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "swedish" => Ok((Charset::Swedish, false)),
        "chinese" => Ok((Charset::Chinese, true)),
        "" => Ok((Charset::None, false)),
        _ => Err(ConfigError::invalid(format!("unknown charset '{}'", s))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodelistVersion {
    #[default]
    None = 0,
    V5 = 5,
    V6 = 6,
    V7 = 7,
    FrontDoor = 32,
}

impl NodelistVersion {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            NodelistVersion::None => "",
            NodelistVersion::V5 => "5",
            NodelistVersion::V6 => "6",
            NodelistVersion::V7 => "7",
            NodelistVersion::FrontDoor => "fd",
        }
    }
}

pub fn parse_nodelist_version(s: &str) -> Result<NodelistVersion> {
    let s = s.trim();
    match s {
        "5" => Ok(NodelistVersion::V5),
        "6" => Ok(NodelistVersion::V6),
        "7" => Ok(NodelistVersion::V7),
        "" => Ok(NodelistVersion::None),
        _ if s.eq_ignore_ascii_case("fd") => Ok(NodelistVersion::FrontDoor),
        _ => Err(ConfigError::invalid(format!("unknown nodelist version '{}'", s))),
    }
}

// Document-level lookups. A stored integer is taken as the code directly;
// a string goes through the matching parser.

fn int_or_parse<T>(
    doc: &Document,
    path: &str,
    from_int: impl FnOnce(i64) -> Result<T>,
    parse: impl FnOnce(&str) -> Result<T>,
) -> Result<T> {
    match doc.get(path)? {
        ValueRef::Str(s) => parse(s),
        v @ (ValueRef::Int(_) | ValueRef::Uint(_)) => match v.as_int() {
            Some(i) => from_int(i),
            None => Err(ConfigError::invalid(format!("{}: out of range", path))),
        },
        other => Err(ConfigError::invalid(format!(
            "{}: expected string or integer, found {}",
            path,
            other.type_name()
        ))),
    }
}

fn to_i32(path: &str, i: i64) -> Result<i32> {
    i32::try_from(i).map_err(|_| ConfigError::invalid(format!("{}: out of range", path)))
}

/// `maximus.video` plus `maximus.has_snow`. An explicit `has_snow` bool wins
/// over the `/snow` suffix. NotFound only when neither key is present.
pub fn video_mode(doc: &Document) -> Result<(Option<VideoMode>, bool)> {
    let mut found = false;
    let mut mode = None;
    let mut snow = false;
    if let Ok(ValueRef::Str(s)) = doc.get("maximus.video") {
        let (m, sn) = parse_video_mode(s)?;
        mode = Some(m);
        snow = sn;
        found = true;
    }
    if let Ok(ValueRef::Bool(b)) = doc.get("maximus.has_snow") {
        snow = b;
        found = true;
    }
    if !found {
        return Err(ConfigError::not_found("maximus.video"));
    }
    Ok((mode, snow))
}

pub fn log_mode(doc: &Document) -> Result<i32> {
    const PATH: &str = "maximus.log_mode";
    int_or_parse(doc, PATH, |i| to_i32(PATH, i), parse_log_mode)
}

pub fn multitasker(doc: &Document) -> Result<i32> {
    const PATH: &str = "maximus.multitasker";
    int_or_parse(doc, PATH, |i| to_i32(PATH, i), parse_multitasker)
}

/// OR of every token in `general.equipment.handshaking`.
pub fn handshake_mask(doc: &Document) -> Result<Handshake> {
    const PATH: &str = "general.equipment.handshaking";
    match doc.get(PATH)? {
        ValueRef::StrList(items) => items
            .iter()
            .try_fold(Handshake::empty(), |acc, t| Ok(acc | parse_handshaking_token(t)?)),
        other => Err(ConfigError::invalid(format!(
            "{}: expected string list, found {}",
            PATH,
            other.type_name()
        ))),
    }
}

pub fn charset(doc: &Document) -> Result<i32> {
    const PATH: &str = "general.session.charset";
    int_or_parse(doc, PATH, |i| to_i32(PATH, i), |s| parse_charset(s).map(|(c, _)| c.code()))
}

pub fn nodelist_version(doc: &Document) -> Result<i32> {
    const PATH: &str = "matrix.nodelist_version";
    int_or_parse(doc, PATH, |i| to_i32(PATH, i), |s| {
        parse_nodelist_version(s).map(NodelistVersion::code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::parse_str;

    #[test]
    fn test_atoi_like_c() {
        assert_eq!(atoi("  42abc"), 42);
        assert_eq!(atoi("-7"), -7);
        assert_eq!(atoi("x"), 0);
        assert_eq!(atoi("99999999999"), i32::MAX);
    }

    #[test]
    fn test_video_modes() {
        assert_eq!(parse_video_mode("IBM/Snow").unwrap(), (VideoMode::Ibm, true));
        assert_eq!(parse_video_mode("bios").unwrap(), (VideoMode::Bios, false));
        assert_eq!(parse_video_mode("fossil").unwrap().0.code(), 1);
        assert!(parse_video_mode("cga").is_err());
    }

    #[test]
    fn test_log_and_multitasker() {
        assert_eq!(parse_log_mode("Verbose").unwrap(), LOG_VERBOSE);
        assert_eq!(parse_log_mode("3").unwrap(), 3);
        assert!(parse_log_mode("loud").is_err());
        assert_eq!(parse_multitasker("OS/2").unwrap(), MULTITASKER_OS2);
        assert_eq!(parse_multitasker("-1").unwrap(), MULTITASKER_AUTO);
        assert!(parse_multitasker("-").is_err());
        assert_eq!(multitasker_name(MULTITASKER_PCMOS), Some("pc-mos"));
    }

    #[test]
    fn test_charset_sets_high_bit_for_chinese() {
        assert_eq!(parse_charset("chinese").unwrap(), (Charset::Chinese, true));
        assert_eq!(parse_charset("").unwrap(), (Charset::None, false));
        assert!(parse_charset("klingon").is_err());
    }

    #[test]
    fn test_nodelist_versions() {
        assert_eq!(parse_nodelist_version("FD").unwrap().code(), 32);
        assert_eq!(parse_nodelist_version("7").unwrap(), NodelistVersion::V7);
        assert!(parse_nodelist_version("8").is_err());
    }

    #[test]
    fn test_document_lookups() {
        let mut doc = Document::new();
        let t = parse_str(
            "video = \"ibm/snow\"\nhas_snow = false\nlog_mode = 6\nmultitasker = \"unix\"\n",
            "t",
        )
        .unwrap();
        doc.mount(t, "maximus").unwrap();
        let t = parse_str("handshaking = [\"xon\", \"cts\"]\n", "t").unwrap();
        doc.mount(t, "general.equipment").unwrap();

        assert_eq!(video_mode(&doc).unwrap(), (Some(VideoMode::Ibm), false));
        assert_eq!(log_mode(&doc).unwrap(), LOG_TRACE);
        assert_eq!(multitasker(&doc).unwrap(), MULTITASKER_UNIX);
        assert_eq!(handshake_mask(&doc).unwrap(), Handshake::XON | Handshake::CTS);
        assert!(matches!(charset(&doc), Err(ConfigError::NotFound(_))));
    }
}
