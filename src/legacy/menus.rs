//! `menus.ctl`: menu definitions and their options.
//!
//! ```text
//! Menu MAIN
//!     Title       Main Menu (%t mins)
//!     MenuFile    misc/menu Novice
//!     NoDsp Display_Menu  MESSAGE  Demoted "Message areas" "M"
//! End Menu
//! ```
//!
//! `%` is a comment only at the start of a line; it shows up inside titles.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Result;
use crate::fsutil;
use crate::logutil::escape_log;
use crate::schema::enums::atoi;
use crate::schema::{Menu, MenuOption};

use super::{is_space, kw_value, split_word, trim};

/// Option modifiers in the order they are written back out.
const MODIFIERS: [&str; 15] = [
    "Local", "Matrix", "Echo", "Conf", "NoDsp", "Ctl", "NoCLS", "NoRIP", "RIP", "Then", "Else",
    "Stay", "UsrLocal", "UsrRemote", "ReRead",
];

const DISPLAY_TYPES: [&str; 4] = ["Novice", "Regular", "Expert", "RIP"];

/// Display types named in `s`. Naming none, or every one the file kind
/// allows, reads as "all" and yields an empty list.
fn display_types(s: &str, allow_rip: bool) -> Vec<String> {
    let allowed = if allow_rip { &DISPLAY_TYPES[..] } else { &DISPLAY_TYPES[..3] };
    let mut seen = [false; 4];
    for token in s.split_whitespace() {
        if let Some(i) = allowed.iter().position(|t| t.eq_ignore_ascii_case(token)) {
            seen[i] = true;
        }
    }
    let count = seen.iter().filter(|&&s| s).count();
    if count == 0 || count == allowed.len() {
        return Vec::new();
    }
    allowed
        .iter()
        .zip(seen)
        .filter(|(_, on)| *on)
        .map(|(t, _)| t.to_string())
        .collect()
}

/// Strips leading modifier words from `line`, returning them in canonical
/// order along with the rest of the line.
fn take_modifiers(mut line: &str) -> (Vec<String>, &str) {
    let mut seen = [false; MODIFIERS.len()];
    loop {
        let (word, rest) = split_word(line);
        match MODIFIERS.iter().position(|m| m.eq_ignore_ascii_case(word)) {
            Some(i) if !word.is_empty() => {
                seen[i] = true;
                line = rest;
            }
            _ => break,
        }
    }
    let mods = MODIFIERS
        .iter()
        .zip(seen)
        .filter(|(_, on)| *on)
        .map(|(m, _)| m.to_string())
        .collect();
    (mods, trim(line))
}

/// `[modifiers] command [arguments] priv "description" ["keypoke"]`.
fn parse_option(line: &str) -> Option<MenuOption> {
    let (modifiers, rest) = take_modifiers(line);
    let (command, rest) = split_word(rest);
    if command.is_empty() || rest.is_empty() {
        return None;
    }

    let (head, quoted) = rest.split_once('"')?;
    let head = trim(head);
    let (arguments, priv_level) = match head.rfind(is_space) {
        Some(i) => (trim(&head[..i]), trim(&head[i..])),
        None => ("", head),
    };

    let (description, tail) = quoted.split_once('"')?;
    let key_poke = tail
        .split_once('"')
        .and_then(|(_, k)| k.split_once('"'))
        .map(|(k, _)| k)
        .unwrap_or("");

    Some(MenuOption {
        command: command.to_string(),
        arguments: arguments.to_string(),
        priv_level: priv_level.to_string(),
        description: description.to_string(),
        key_poke: key_poke.to_string(),
        modifiers,
    })
}

/// File name plus the display types that follow it.
fn file_and_types(v: &str, allow_rip: bool) -> (String, Vec<String>) {
    let (file, types) = split_word(v);
    (file.to_string(), display_types(types, allow_rip))
}

/// Parses menu definitions out of `text`; `source` only labels log lines.
pub fn read_menus(source: &str, text: &str) -> Vec<Menu> {
    let mut menus: Vec<Menu> = Vec::new();
    let mut in_menu = false;

    for (i, raw) in text.lines().enumerate() {
        let line = trim(raw);
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = kw_value(line, "Menu") {
            menus.push(Menu {
                name: name.to_string(),
                ..Menu::default()
            });
            in_menu = true;
            continue;
        }
        if line.get(..3).is_some_and(|h| h.eq_ignore_ascii_case("End")) {
            in_menu = false;
            continue;
        }
        let Some(menu) = menus.last_mut().filter(|_| in_menu) else {
            continue;
        };

        if let Some(v) = kw_value(line, "Title") {
            menu.title = v.to_string();
        } else if let Some(v) = kw_value(line, "HeaderFile") {
            (menu.header_file, menu.header_types) = file_and_types(v, true);
        } else if let Some(v) = kw_value(line, "MenuFile") {
            (menu.menu_file, menu.menu_types) = file_and_types(v, true);
        } else if let Some(v) = kw_value(line, "FooterFile") {
            // no footer slot in the menu schema
            debug!("{}:{}: footer file '{}' dropped", source, i + 1, escape_log(v));
        } else if let Some(v) = kw_value(line, "MenuLength") {
            menu.menu_length = atoi(v);
        } else if let Some(v) = kw_value(line, "MenuColor").or_else(|| kw_value(line, "MenuColour")) {
            menu.menu_color = atoi(v);
        } else if let Some(v) = kw_value(line, "OptionWidth") {
            menu.option_width = atoi(v);
        } else {
            match parse_option(line) {
                Some(opt) => menu.add_option(opt),
                None => debug!("{}:{}: not an option: '{}'", source, i + 1, escape_log(line)),
            }
        }
    }
    menus
}

/// Where `menus.ctl` lives: `etc/` first, then the converter's
/// `config/legacy/` copy.
pub fn menus_ctl_path(sys_dir: &Path) -> Option<PathBuf> {
    [
        sys_dir.join("etc").join("menus.ctl"),
        sys_dir.join("config").join("legacy").join("menus.ctl"),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Menus from the install under `sys_dir`; none if no `menus.ctl` exists.
pub fn parse_menus_ctl(sys_dir: &Path) -> Result<Vec<Menu>> {
    let Some(path) = menus_ctl_path(sys_dir) else {
        warn!("no menus.ctl under {}", sys_dir.display());
        return Ok(Vec::new());
    };
    let text = fsutil::read_text(&path)?;
    let menus = read_menus(&path.display().to_string(), &text);
    debug!("{}: {} menus", path.display(), menus.len());
    Ok(menus)
}
