//! `matrix.toml`: netmail and echomail privileges, exit levels and the
//! board's network addresses.

use std::fmt;

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::value::{Table, Value, ValueRef};

use super::{Fields, TomlWriter};

/// Message attribute paired with the privilege level that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePriv {
    pub attribute: String,
    pub priv_level: i32,
}

/// FidoNet `zone:net/node.point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetAddress {
    pub zone: i32,
    pub net: i32,
    pub node: i32,
    pub point: i32,
}

impl NetAddress {
    /// Parses `z:n/f` or `z:n/f.p`; fewer than three numbers is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let nums: Vec<i32> = s
            .trim()
            .split(|c| matches!(c, ':' | '/' | '.'))
            .map(|p| p.trim().parse::<i32>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        if nums.len() < 3 || nums.len() > 4 {
            return None;
        }
        Some(Self {
            zone: nums[0],
            net: nums[1],
            node: nums[2],
            point: nums.get(3).copied().unwrap_or(0),
        })
    }
}

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.zone, self.net, self.node)?;
        if self.point != 0 {
            write!(f, ".{}", self.point)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Matrix {
    pub ctla_priv: i32,
    pub seenby_priv: i32,
    pub private_priv: i32,
    pub fromfile_priv: i32,
    pub unlisted_priv: i32,
    pub unlisted_cost: i32,
    pub log_echomail: bool,
    pub after_edit_exit: i32,
    pub after_echomail_exit: i32,
    pub after_local_exit: i32,
    pub nodelist_version: String,
    pub fidouser: String,
    pub echotoss_name: String,
    pub message_edit_ask: Vec<AttributePriv>,
    pub message_edit_assume: Vec<AttributePriv>,
    pub addresses: Vec<NetAddress>,
}

fn attribute_privs(me: &Table, key: &str) -> Result<Vec<AttributePriv>> {
    let t = match me.get(key) {
        None => return Ok(Vec::new()),
        Some(Value::Table(t)) => t,
        Some(other) => {
            return Err(ConfigError::invalid(format!(
                "message_edit.{}: expected table, found {}",
                key,
                other.type_name()
            )))
        }
    };
    t.iter()
        .map(|(attr, v)| {
            let priv_level = v
                .as_ref()
                .as_int()
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(|| {
                    ConfigError::invalid(format!(
                        "message_edit.{}.{}: expected integer, found {}",
                        key,
                        attr,
                        v.type_name()
                    ))
                })?;
            Ok(AttributePriv {
                attribute: attr.to_string(),
                priv_level,
            })
        })
        .collect()
}

impl Matrix {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        let (ask, assume) = match f.raw("message_edit")? {
            None => (Vec::new(), Vec::new()),
            Some(ValueRef::Table(me)) => (attribute_privs(me, "ask")?, attribute_privs(me, "assume")?),
            Some(other) => {
                return Err(ConfigError::invalid(format!(
                    "message_edit: expected table, found {}",
                    other.type_name()
                )))
            }
        };
        let addresses = f
            .table_list("address")?
            .iter()
            .map(|a| {
                Ok(NetAddress {
                    zone: a.int("zone", 0)?,
                    net: a.int("net", 0)?,
                    node: a.int("node", 0)?,
                    point: a.int("point", 0)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            ctla_priv: f.int("ctla_priv", 0)?,
            seenby_priv: f.int("seenby_priv", 0)?,
            private_priv: f.int("private_priv", 0)?,
            fromfile_priv: f.int("fromfile_priv", 0)?,
            unlisted_priv: f.int("unlisted_priv", 0)?,
            unlisted_cost: f.int("unlisted_cost", 0)?,
            log_echomail: f.bool("log_echomail", false)?,
            after_edit_exit: f.int("after_edit_exit", 0)?,
            after_echomail_exit: f.int("after_echomail_exit", 0)?,
            after_local_exit: f.int("after_local_exit", 0)?,
            nodelist_version: nodelist_string(&f)?,
            fidouser: f.str("fidouser")?,
            echotoss_name: f.str("echotoss_name")?,
            message_edit_ask: ask,
            message_edit_assume: assume,
            addresses,
        })
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.int("ctla_priv", self.ctla_priv.into())
            .int("seenby_priv", self.seenby_priv.into())
            .int("private_priv", self.private_priv.into())
            .int("fromfile_priv", self.fromfile_priv.into())
            .int("unlisted_priv", self.unlisted_priv.into())
            .int("unlisted_cost", self.unlisted_cost.into())
            .bool("log_echomail", self.log_echomail)
            .int("after_edit_exit", self.after_edit_exit.into())
            .int("after_echomail_exit", self.after_echomail_exit.into())
            .int("after_local_exit", self.after_local_exit.into())
            .str("nodelist_version", &self.nodelist_version)
            .str("fidouser", &self.fidouser)
            .str("echotoss_name", &self.echotoss_name);

        for (name, list) in [
            ("message_edit.ask", &self.message_edit_ask),
            ("message_edit.assume", &self.message_edit_assume),
        ] {
            if list.is_empty() {
                continue;
            }
            w.section(name);
            for ap in list.iter().filter(|ap| !ap.attribute.is_empty()) {
                w.int(&ap.attribute, ap.priv_level.into());
            }
        }

        for a in &self.addresses {
            w.list_entry("address")
                .int("zone", a.zone.into())
                .int("net", a.net.into())
                .int("node", a.node.into())
                .int("point", a.point.into());
        }
        w.finish()
    }
}

// Older files carry the nodelist version as a bare integer.
fn nodelist_string(f: &Fields<'_>) -> Result<String> {
    match f.raw("nodelist_version")? {
        None => Ok(String::new()),
        Some(ValueRef::Str(s)) => Ok(s.to_string()),
        Some(v @ (ValueRef::Int(_) | ValueRef::Uint(_))) => Ok(match v.as_int() {
            Some(32) => "fd".to_string(),
            Some(i) => i.to_string(),
            None => String::new(),
        }),
        Some(other) => Err(ConfigError::invalid(format!(
            "nodelist_version: expected string, found {}",
            other.type_name()
        ))),
    }
}
