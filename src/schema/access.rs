//! `security/access_levels.toml`: privilege classes.

use crate::document::Document;
use crate::error::Result;

use super::{Fields, TomlWriter};

/// Level assigned to the `hidden` pseudo-class.
pub const HIDDEN_LEVEL: i32 = 65535;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessLevel {
    pub name: String,
    pub level: i32,
    pub description: String,
    pub alias: String,
    pub key: String,
    pub time: i32,
    pub cume: i32,
    pub calls: i32,
    pub logon_baud: i32,
    pub xfer_baud: i32,
    pub file_limit: i32,
    pub file_ratio: i32,
    pub ratio_free: i32,
    pub upload_reward: i32,
    pub login_file: String,
    pub flags: Vec<String>,
    pub mail_flags: Vec<String>,
    pub user_flags: u32,
    pub oldpriv: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessLevels {
    pub levels: Vec<AccessLevel>,
}

impl AccessLevel {
    fn read(f: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: f.str("name")?,
            level: f.int("level", 0)?,
            description: f.str("description")?,
            alias: f.str("alias")?,
            key: f.str("key")?,
            time: f.int("time", 0)?,
            cume: f.int("cume", 0)?,
            calls: f.int("calls", 0)?,
            logon_baud: f.int("logon_baud", 0)?,
            xfer_baud: f.int("xfer_baud", 0)?,
            file_limit: f.int("file_limit", 0)?,
            file_ratio: f.int("file_ratio", 0)?,
            ratio_free: f.int("ratio_free", 0)?,
            upload_reward: f.int("upload_reward", 0)?,
            login_file: f.str("login_file")?,
            flags: f.str_list("flags")?,
            mail_flags: f.str_list("mail_flags")?,
            user_flags: f.uint("user_flags", 0)?,
            oldpriv: f.int("oldpriv", 0)?,
        })
    }
}

impl AccessLevels {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        let levels = f
            .table_list("access_level")?
            .iter()
            .map(AccessLevel::read)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { levels })
    }

    pub fn find(&self, name: &str) -> Option<&AccessLevel> {
        self.levels.iter().find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Resolves a privilege written as digits, a class name or `hidden`.
    /// Anything else resolves to 0.
    pub fn priv_level(&self, value: &str) -> i32 {
        let value = value.trim();
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            return value.parse().unwrap_or(i32::MAX);
        }
        if let Some(l) = self.find(value) {
            return l.level;
        }
        if value.eq_ignore_ascii_case("hidden") {
            return HIDDEN_LEVEL;
        }
        0
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        for l in &self.levels {
            w.list_entry("access_level")
                .str("name", &l.name)
                .int("level", l.level.into())
                .str("description", &l.description)
                .str("alias", &l.alias)
                .str("key", &l.key)
                .int("time", l.time.into())
                .int("cume", l.cume.into())
                .int("calls", l.calls.into())
                .int("logon_baud", l.logon_baud.into())
                .int("xfer_baud", l.xfer_baud.into())
                .int("file_limit", l.file_limit.into())
                .int("file_ratio", l.file_ratio.into())
                .int("ratio_free", l.ratio_free.into())
                .int("upload_reward", l.upload_reward.into())
                .str("login_file", &l.login_file)
                .str_list("flags", &l.flags)
                .str_list("mail_flags", &l.mail_flags)
                .uint("user_flags", l.user_flags.into())
                .int("oldpriv", l.oldpriv.into());
        }
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::parse_str;

    fn levels() -> AccessLevels {
        AccessLevels {
            levels: vec![
                AccessLevel {
                    name: "Normal".into(),
                    level: 30,
                    description: "Regular caller".into(),
                    calls: -1,
                    logon_baud: 300,
                    xfer_baud: 300,
                    flags: vec!["ShowHidden".into()],
                    user_flags: 0xff00,
                    ..AccessLevel::default()
                },
                AccessLevel {
                    name: "SysOp".into(),
                    level: 100,
                    key: "s".into(),
                    ..AccessLevel::default()
                },
            ],
        }
    }

    #[test]
    fn test_round_trip() {
        let l = levels();
        let text = l.to_toml();
        assert!(text.starts_with("[[access_level]]\nname = \"Normal\"\nlevel = 30\n"));
        assert!(text.contains("user_flags = 65280\n"));
        assert!(text.contains("oldpriv = 0\n\n[[access_level]]\nname = \"SysOp\"\n"));
        let mut doc = Document::new();
        doc.mount(parse_str(&text, "t").unwrap(), "security.access_levels")
            .unwrap();
        assert_eq!(
            AccessLevels::from_document(&doc, "security.access_levels").unwrap(),
            l
        );
    }

    #[test]
    fn test_priv_level_resolution() {
        let l = levels();
        assert_eq!(l.priv_level("42"), 42);
        assert_eq!(l.priv_level("sysop"), 100);
        assert_eq!(l.priv_level("Hidden"), HIDDEN_LEVEL);
        assert_eq!(l.priv_level("Twit"), 0);
        assert_eq!(l.priv_level(""), 0);
    }
}
