//! `areas/msg/areas.toml` and `areas/file/areas.toml`: divisions followed
//! by areas. An area names its parent division by dotted key.

use bitflags::bitflags;

use crate::document::Document;
use crate::error::Result;

use super::{Fields, TomlWriter};

bitflags! {
    /// Message area style bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MsgStyle: u32 {
        const SQUISH = 0x0001;
        const DOTMSG = 0x0002;
        const LOCAL = 0x0004;
        const NET = 0x0008;
        const ECHO = 0x0010;
        const CONF = 0x0020;
        const PVT = 0x0040;
        const PUB = 0x0080;
        const HIBIT = 0x0100;
        const ANON = 0x0200;
        const NORNK = 0x0400;
        const REALNAME = 0x0800;
        const ALIAS = 0x1000;
        const AUDIT = 0x2000;
        const READONLY = 0x4000;
        const HIDDEN = 0x8000;
        const ATTACH = 0x1_0000;
        const NOMAILCHK = 0x2_0000;
    }
}

// Canonical token order after the format and area type tokens.
const STYLE_TAIL: [(MsgStyle, &str); 12] = [
    (MsgStyle::PVT, "Pvt"),
    (MsgStyle::PUB, "Pub"),
    (MsgStyle::HIBIT, "HiBit"),
    (MsgStyle::ANON, "Anon"),
    (MsgStyle::NORNK, "NoNameKludge"),
    (MsgStyle::REALNAME, "RealName"),
    (MsgStyle::ALIAS, "Alias"),
    (MsgStyle::AUDIT, "Audit"),
    (MsgStyle::READONLY, "ReadOnly"),
    (MsgStyle::HIDDEN, "Hidden"),
    (MsgStyle::ATTACH, "Attach"),
    (MsgStyle::NOMAILCHK, "NoMailCheck"),
];

impl MsgStyle {
    /// One style token, case-insensitively; accepts the spellings found in
    /// both control files and TOML.
    pub fn parse_token(token: &str) -> Option<Self> {
        let t = token.to_ascii_lowercase();
        Some(match t.as_str() {
            "squish" => Self::SQUISH,
            "*.msg" | ".msg" | "sdm" => Self::DOTMSG,
            "local" => Self::LOCAL,
            "net" | "netmail" => Self::NET,
            "echo" | "echomail" => Self::ECHO,
            "conf" => Self::CONF,
            "pvt" | "private" => Self::PVT,
            "pub" | "public" => Self::PUB,
            "hibit" | "highbit" => Self::HIBIT,
            "anon" => Self::ANON,
            "nonamekludge" | "nornk" => Self::NORNK,
            "realname" => Self::REALNAME,
            "alias" => Self::ALIAS,
            "audit" => Self::AUDIT,
            "readonly" => Self::READONLY,
            "hidden" => Self::HIDDEN,
            "attach" => Self::ATTACH,
            "nomailcheck" | "nomailchk" => Self::NOMAILCHK,
            _ => return None,
        })
    }

    /// Union of the known tokens; unknown ones are skipped.
    pub fn from_tokens<S: AsRef<str>>(tokens: impl IntoIterator<Item = S>) -> Self {
        tokens
            .into_iter()
            .filter_map(|t| Self::parse_token(t.as_ref()))
            .fold(Self::empty(), |acc, s| acc | s)
    }

    /// Canonical token list. Of the exclusive groups only the first set
    /// member is written: Squish before `*.MSG`, then Local, Net, Echo, Conf.
    pub fn to_tokens(self) -> Vec<String> {
        let mut out = Vec::new();
        if self.contains(Self::SQUISH) {
            out.push("Squish");
        } else if self.contains(Self::DOTMSG) {
            out.push("*.MSG");
        }
        if let Some(kind) = [
            (Self::LOCAL, "Local"),
            (Self::NET, "Net"),
            (Self::ECHO, "Echo"),
            (Self::CONF, "Conf"),
        ]
        .into_iter()
        .find(|(f, _)| self.contains(*f))
        {
            out.push(kind.1);
        }
        out.extend(
            STYLE_TAIL
                .iter()
                .filter(|(f, _)| self.contains(*f))
                .map(|(_, n)| *n),
        );
        out.into_iter().map(str::to_string).collect()
    }
}

bitflags! {
    /// File area medium flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileTypes: u8 {
        const SLOW = 0x01;
        const STAGED = 0x02;
        const NONEW = 0x04;
        const CD = Self::SLOW.bits() | Self::STAGED.bits() | Self::NONEW.bits();
    }
}

impl FileTypes {
    pub fn from_tokens<S: AsRef<str>>(tokens: impl IntoIterator<Item = S>) -> Self {
        let mut out = Self::empty();
        for t in tokens {
            match t.as_ref().to_ascii_lowercase().as_str() {
                "cd" => return Self::CD,
                "slow" => out |= Self::SLOW,
                "staged" => out |= Self::STAGED,
                "nonew" => out |= Self::NONEW,
                _ => {}
            }
        }
        out
    }

    /// `["CD"]` when all three are set, otherwise the individual tokens.
    pub fn to_tokens(self) -> Vec<String> {
        if self.contains(Self::CD) {
            return vec!["CD".to_string()];
        }
        [(Self::SLOW, "Slow"), (Self::STAGED, "Staged"), (Self::NONEW, "NoNew")]
            .into_iter()
            .filter(|(f, _)| self.contains(*f))
            .map(|(_, n)| n.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Division {
    pub name: String,
    /// Dotted path of division names from the root.
    pub key: String,
    pub description: String,
    pub acs: String,
    pub display_file: String,
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgArea {
    pub name: String,
    pub description: String,
    pub acs: String,
    pub menu: String,
    pub division: String,
    pub tag: String,
    pub path: String,
    pub owner: String,
    pub origin: String,
    pub attach_path: String,
    pub barricade: String,
    pub style: Vec<String>,
    pub renum_max: i32,
    pub renum_days: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileArea {
    pub name: String,
    pub description: String,
    pub acs: String,
    pub menu: String,
    pub division: String,
    pub download: String,
    pub upload: String,
    pub filelist: String,
    pub barricade: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgAreas {
    pub divisions: Vec<Division>,
    pub areas: Vec<MsgArea>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileAreas {
    pub divisions: Vec<Division>,
    pub areas: Vec<FileArea>,
}

impl Division {
    fn read(f: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: f.str("name")?,
            key: f.str("key")?,
            description: f.str("description")?,
            acs: f.str("acs")?,
            display_file: f.str("display_file")?,
            level: f.int("level", 0)?,
        })
    }

    fn write(&self, w: &mut TomlWriter) {
        w.list_entry("division")
            .str("name", &self.name)
            .str("key", &self.key)
            .str("description", &self.description)
            .str("acs", &self.acs)
            .str("display_file", &self.display_file)
            .int("level", self.level.into());
    }
}

fn read_divisions(f: &Fields<'_>) -> Result<Vec<Division>> {
    f.table_list("division")?.iter().map(Division::read).collect()
}

impl MsgArea {
    pub fn style_flags(&self) -> MsgStyle {
        MsgStyle::from_tokens(&self.style)
    }

    fn read(f: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: f.str("name")?,
            description: f.str("description")?,
            acs: f.str("acs")?,
            menu: f.str("menu")?,
            division: f.str("division")?,
            tag: f.str("tag")?,
            path: f.str("path")?,
            owner: f.str("owner")?,
            origin: f.str("origin")?,
            attach_path: f.str("attach_path")?,
            barricade: f.str("barricade")?,
            style: f.str_list("style")?,
            renum_max: f.int("renum_max", 0)?,
            renum_days: f.int("renum_days", 0)?,
        })
    }
}

impl FileArea {
    pub fn type_flags(&self) -> FileTypes {
        FileTypes::from_tokens(&self.types)
    }

    fn read(f: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: f.str("name")?,
            description: f.str("description")?,
            acs: f.str("acs")?,
            menu: f.str("menu")?,
            division: f.str("division")?,
            download: f.str("download")?,
            upload: f.str("upload")?,
            filelist: f.str("filelist")?,
            barricade: f.str("barricade")?,
            types: f.str_list("types")?,
        })
    }
}

impl MsgAreas {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        Ok(Self {
            divisions: read_divisions(&f)?,
            areas: f
                .table_list("area")?
                .iter()
                .map(MsgArea::read)
                .collect::<Result<_>>()?,
        })
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        for d in &self.divisions {
            d.write(&mut w);
        }
        for a in &self.areas {
            w.list_entry("area")
                .str("name", &a.name)
                .str("description", &a.description)
                .str("acs", &a.acs)
                .str("menu", &a.menu)
                .str("division", &a.division)
                .str("tag", &a.tag)
                .str("path", &a.path)
                .str("owner", &a.owner)
                .str("origin", &a.origin)
                .str("attach_path", &a.attach_path)
                .str("barricade", &a.barricade)
                .str_list("style", &a.style)
                .int("renum_max", a.renum_max.into())
                .int("renum_days", a.renum_days.into());
        }
        w.finish()
    }
}

impl FileAreas {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        Ok(Self {
            divisions: read_divisions(&f)?,
            areas: f
                .table_list("area")?
                .iter()
                .map(FileArea::read)
                .collect::<Result<_>>()?,
        })
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        for d in &self.divisions {
            d.write(&mut w);
        }
        for a in &self.areas {
            w.list_entry("area")
                .str("name", &a.name)
                .str("description", &a.description)
                .str("acs", &a.acs)
                .str("menu", &a.menu)
                .str("division", &a.division)
                .str("download", &a.download)
                .str("upload", &a.upload)
                .str("filelist", &a.filelist)
                .str("barricade", &a.barricade)
                .str_list("types", &a.types);
        }
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::value::parse_str;

    #[test]
    fn test_style_canonical_order() {
        let s = MsgStyle::from_tokens(["Pvt", "Echo", "Local", "*.MSG", "Squish", "bogus", "highbit"]);
        assert!(s.contains(MsgStyle::ECHO | MsgStyle::LOCAL | MsgStyle::DOTMSG));
        assert_eq!(s.to_tokens(), vec!["Squish", "Local", "Pvt", "HiBit"]);
        assert_eq!(
            MsgStyle::from_tokens(["NoMailChk", "NoRnk"]).to_tokens(),
            vec!["NoNameKludge", "NoMailCheck"]
        );
    }

    #[test]
    fn test_file_types_cd() {
        assert_eq!(FileTypes::from_tokens(["cd"]), FileTypes::CD);
        assert_eq!(FileTypes::CD.to_tokens(), vec!["CD"]);
        let t = FileTypes::from_tokens(["Slow", "NoNew"]);
        assert_eq!(t.to_tokens(), vec!["Slow", "NoNew"]);
        assert_eq!((FileTypes::SLOW | FileTypes::STAGED | FileTypes::NONEW).to_tokens(), vec!["CD"]);
    }

    #[test]
    fn test_msg_areas_round_trip() {
        let areas = MsgAreas {
            divisions: vec![Division {
                name: "fido".into(),
                key: "fido".into(),
                description: "FidoNet".into(),
                ..Division::default()
            }],
            areas: vec![MsgArea {
                name: "muffin".into(),
                division: "fido".into(),
                tag: "MUFFIN".into(),
                path: "msg/muffin".into(),
                style: vec!["Squish".into(), "Echo".into(), "Pub".into()],
                renum_max: 500,
                ..MsgArea::default()
            }],
        };
        let text = areas.to_toml();
        assert!(text.starts_with("[[division]]\nname = \"fido\"\n"));
        assert!(text.contains("level = 0\n\n[[area]]\nname = \"muffin\"\n"));
        let mut doc = Document::new();
        doc.mount(parse_str(&text, "t").unwrap(), "areas.msg").unwrap();
        let back = MsgAreas::from_document(&doc, "areas.msg").unwrap();
        assert_eq!(back, areas);
        assert!(back.areas[0].style_flags().contains(MsgStyle::ECHO));
    }

    #[test]
    fn test_file_areas_round_trip() {
        let areas = FileAreas {
            divisions: Vec::new(),
            areas: vec![FileArea {
                name: "uploads".into(),
                download: "files/up".into(),
                types: FileTypes::CD.to_tokens(),
                ..FileArea::default()
            }],
        };
        let mut doc = Document::new();
        doc.mount(parse_str(&areas.to_toml(), "t").unwrap(), "areas.file")
            .unwrap();
        let back = FileAreas::from_document(&doc, "areas.file").unwrap();
        assert_eq!(back.areas[0].type_flags(), FileTypes::CD);
    }

    #[test]
    fn test_area_must_be_table_list() {
        let mut doc = Document::new();
        doc.mount(parse_str("area = \"x\"\n", "t").unwrap(), "areas.msg").unwrap();
        assert!(matches!(
            MsgAreas::from_document(&doc, "areas.msg"),
            Err(ConfigError::InvalidArgument(_))
        ));
    }
}
