//! `etc/msgarea.ctl` and `etc/filearea.ctl`.
//!
//! ```text
//! MsgDivisionBegin local Normal misc/local Local discussion
//!     MsgArea chat
//!         Desc  General chatter
//!         Path  spool/chat
//!         Style Squish Local Pub
//!     End MsgArea
//! MsgDivisionEnd
//! ```
//!
//! Divisions nest when a `...DivisionBegin` appears before the enclosing
//! `...DivisionEnd`. An area opened inside another area, or still open at
//! the end of the file, fails the whole file.

use std::path::Path;

use log::{debug, warn};

use crate::area_tree::{AreaRecord, AreaTree, DivisionInfo, NodeId, NodeKind};
use crate::error::{ConfigError, Result};
use crate::logutil::escape_log;
use crate::schema::areas::{FileTypes, MsgStyle};
use crate::schema::enums::atoi;
use crate::schema::{FileArea, MsgArea};

use super::{kw_value, split_word, CtlFile};

struct Grammar<A> {
    division_begin: &'static str,
    division_end: &'static str,
    area_begin: &'static str,
    area_end: &'static str,
    new_area: fn(&str) -> A,
    /// Applies one keyword line to the open area.
    apply: fn(&mut A, &str),
}

const MSG_GRAMMAR: Grammar<MsgArea> = Grammar {
    division_begin: "MsgDivisionBegin",
    division_end: "MsgDivisionEnd",
    area_begin: "MsgArea",
    area_end: "End MsgArea",
    new_area: new_msg_area,
    apply: apply_msg_keyword,
};

const FILE_GRAMMAR: Grammar<FileArea> = Grammar {
    division_begin: "FileDivisionBegin",
    division_end: "FileDivisionEnd",
    area_begin: "FileArea",
    area_end: "End FileArea",
    new_area: new_file_area,
    apply: apply_file_keyword,
};

fn new_msg_area(name: &str) -> MsgArea {
    MsgArea {
        name: name.to_string(),
        style: (MsgStyle::SQUISH | MsgStyle::LOCAL | MsgStyle::PUB).to_tokens(),
        ..MsgArea::default()
    }
}

fn apply_msg_keyword(a: &mut MsgArea, line: &str) {
    let string_fields: [(&str, &mut String); 9] = [
        ("Desc", &mut a.description),
        ("Path", &mut a.path),
        ("Tag", &mut a.tag),
        ("ACS", &mut a.acs),
        ("Owner", &mut a.owner),
        ("Origin", &mut a.origin),
        ("AttachPath", &mut a.attach_path),
        ("Barricade", &mut a.barricade),
        ("MenuName", &mut a.menu),
    ];
    for (kw, dst) in string_fields {
        if let Some(v) = kw_value(line, kw) {
            *dst = v.to_string();
            return;
        }
    }
    if let Some(v) = kw_value(line, "Style") {
        a.style = MsgStyle::from_tokens(v.split_whitespace()).to_tokens();
    } else if let Some(v) = kw_value(line, "Renum Max") {
        a.renum_max = atoi(v);
    } else if let Some(v) = kw_value(line, "Renum Days") {
        a.renum_days = atoi(v);
    }
}

fn new_file_area(name: &str) -> FileArea {
    FileArea {
        name: name.to_string(),
        ..FileArea::default()
    }
}

fn apply_file_keyword(a: &mut FileArea, line: &str) {
    let string_fields: [(&str, &mut String); 7] = [
        ("Desc", &mut a.description),
        ("Download", &mut a.download),
        ("Upload", &mut a.upload),
        ("ACS", &mut a.acs),
        ("FileList", &mut a.filelist),
        ("Barricade", &mut a.barricade),
        ("MenuName", &mut a.menu),
    ];
    for (kw, dst) in string_fields {
        if let Some(v) = kw_value(line, kw) {
            *dst = v.to_string();
            return;
        }
    }
    if let Some(v) = kw_value(line, "Type") {
        let types = a.type_flags() | FileTypes::from_tokens(v.split_whitespace());
        a.types = types.to_tokens();
    }
}

fn parse_tree<A: AreaRecord>(ctl: &CtlFile, g: &Grammar<A>) -> Result<AreaTree<A>> {
    let path = ctl.path().display().to_string();
    let mut tree = AreaTree::new();
    let mut division: Option<NodeId> = None;
    let mut open: Option<(usize, A)> = None;

    for (n, line) in ctl.lines() {
        if let Some(rest) = kw_value(line, g.division_begin) {
            if open.is_some() {
                return Err(ConfigError::parse(&path, n, "division begins inside an area"));
            }
            let (name, rest) = split_word(rest);
            let (acs, rest) = split_word(rest);
            let (display_file, description) = split_word(rest);
            if name.is_empty() {
                return Err(ConfigError::parse(&path, n, "division without a name"));
            }
            let info = DivisionInfo {
                acs: acs.to_string(),
                display_file: display_file.to_string(),
            };
            let id = tree.create(name, name, description, NodeKind::Division(info), 0);
            tree.attach(id, division);
            division = Some(id);
            continue;
        }

        if kw_value(line, g.division_end).is_some() {
            match division {
                Some(d) => division = tree.node(d).parent(),
                None => warn!("{}:{}: {} without an open division", path, n, g.division_end),
            }
            continue;
        }

        if let Some(name) = kw_value(line, g.area_begin) {
            if let Some((start, _)) = &open {
                return Err(ConfigError::parse(
                    &path,
                    n,
                    format!("area begins before the one at line {} has ended", start),
                ));
            }
            if name.is_empty() {
                return Err(ConfigError::parse(&path, n, "area without a name"));
            }
            open = Some((n, (g.new_area)(name)));
            continue;
        }

        if kw_value(line, g.area_end).is_some() {
            if let Some((_, area)) = open.take() {
                let name = area.name().to_string();
                let description = match area.description() {
                    "" => name.clone(),
                    d => d.to_string(),
                };
                let id = tree.create(&name, &name, &description, NodeKind::Area(area), 0);
                tree.attach(id, division);
            }
            continue;
        }

        match open.as_mut() {
            Some((_, area)) => (g.apply)(area, line),
            None => debug!("{}:{}: ignoring '{}'", path, n, escape_log(line)),
        }
    }

    if let Some((start, area)) = open {
        return Err(ConfigError::parse(
            &path,
            start,
            format!("area '{}' is never ended", area.name()),
        ));
    }
    debug!("{}: {} nodes", path, tree.len());
    Ok(tree)
}

pub fn read_msg_areas(ctl: &CtlFile) -> Result<AreaTree<MsgArea>> {
    parse_tree(ctl, &MSG_GRAMMAR)
}

pub fn read_file_areas(ctl: &CtlFile) -> Result<AreaTree<FileArea>> {
    parse_tree(ctl, &FILE_GRAMMAR)
}

/// Message areas from `<sys>/etc/msgarea.ctl`.
pub fn parse_msg_areas(sys_dir: &Path) -> Result<AreaTree<MsgArea>> {
    read_msg_areas(&CtlFile::load(&sys_dir.join("etc").join("msgarea.ctl"))?)
}

/// File areas from `<sys>/etc/filearea.ctl`.
pub fn parse_file_areas(sys_dir: &Path) -> Result<AreaTree<FileArea>> {
    read_file_areas(&CtlFile::load(&sys_dir.join("etc").join("filearea.ctl"))?)
}
