//! `menus/<name>.toml`: one menu, its optional custom layout block and its
//! options.
//!
//! ## Custom menu block
//!
//! `[custom_menu]` is lenient: a malformed field inside it keeps that
//! field's default instead of failing the menu. Everything else follows the
//! usual wrong-type rule.

use std::fmt::Write as _;

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::value::{emit, ValueRef};

use super::colors::{dos_color_from_name, dos_color_name, make_attr};
use super::{Fields, TomlWriter};

pub const DEFAULT_LIGHTBAR_NORMAL: u8 = 0x07;
pub const DEFAULT_LIGHTBAR_SELECTED: u8 = 0x1e;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Left,
    Center,
    Right,
}

impl Justify {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VJustify {
    #[default]
    Top,
    Center,
    Bottom,
}

impl VJustify {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryLayout {
    #[default]
    Grid,
    Tight,
    Spread,
    SpreadWidth,
    SpreadHeight,
}

impl BoundaryLayout {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Some(Self::Grid),
            "tight" => Some(Self::Tight),
            "spread" => Some(Self::Spread),
            "spread_width" => Some(Self::SpreadWidth),
            "spread_height" => Some(Self::SpreadHeight),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Tight => "tight",
            Self::Spread => "spread",
            Self::SpreadWidth => "spread_width",
            Self::SpreadHeight => "spread_height",
        }
    }
}

/// Screen position as `(row, col)`, both 1-based.
pub type Location = (i32, i32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomMenu {
    pub enabled: bool,
    pub skip_canned_menu: bool,
    pub show_title: bool,
    pub lightbar_menu: bool,
    pub lightbar_margin: u8,
    pub top_boundary: Option<Location>,
    pub bottom_boundary: Option<Location>,
    pub title_location: Option<Location>,
    pub prompt_location: Option<Location>,
    /// Explicit lightbar attributes; `None` means the built-in default.
    pub lightbar_normal: Option<u8>,
    pub lightbar_selected: Option<u8>,
    pub lightbar_high: Option<u8>,
    pub lightbar_high_selected: Option<u8>,
    pub option_spacing: bool,
    pub option_justify: Justify,
    pub boundary_justify: Justify,
    pub boundary_vjustify: VJustify,
    pub boundary_layout: BoundaryLayout,
}

impl Default for CustomMenu {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_canned_menu: false,
            show_title: true,
            lightbar_menu: false,
            lightbar_margin: 1,
            top_boundary: None,
            bottom_boundary: None,
            title_location: None,
            prompt_location: None,
            lightbar_normal: None,
            lightbar_selected: None,
            lightbar_high: None,
            lightbar_high_selected: None,
            option_spacing: false,
            option_justify: Justify::Left,
            boundary_justify: Justify::Left,
            boundary_vjustify: VJustify::Top,
            boundary_layout: BoundaryLayout::Grid,
        }
    }
}

fn color_pair(items: &[String]) -> Option<u8> {
    if items.len() < 2 {
        return None;
    }
    Some(make_attr(
        dos_color_from_name(&items[0])?,
        dos_color_from_name(&items[1])?,
    ))
}

fn location(items: &[i64]) -> Option<Location> {
    let row = i32::try_from(*items.first()?).ok()?;
    let col = i32::try_from(*items.get(1)?).ok()?;
    (row > 0 && col > 0).then_some((row, col))
}

impl CustomMenu {
    pub fn normal_attr(&self) -> u8 {
        self.lightbar_normal.unwrap_or(DEFAULT_LIGHTBAR_NORMAL)
    }

    pub fn selected_attr(&self) -> u8 {
        self.lightbar_selected.unwrap_or(DEFAULT_LIGHTBAR_SELECTED)
    }

    /// Sets horizontal and vertical boundary justification from `"h [v]"`.
    /// A bare `center` centres both axes; unknown words are ignored.
    pub fn set_boundary_justify(&mut self, s: &str) {
        let mut words = s.split_whitespace();
        match words.next().and_then(Justify::parse) {
            Some(Justify::Center) => {
                self.boundary_justify = Justify::Center;
                self.boundary_vjustify = VJustify::Center;
            }
            Some(h) => {
                self.boundary_justify = h;
                self.boundary_vjustify = VJustify::Top;
            }
            None => {}
        }
        if let Some(v) = words.next().and_then(VJustify::parse) {
            self.boundary_vjustify = v;
        }
    }

    fn read(f: &Fields<'_>) -> Self {
        let mut cm = Self::default();
        if let Ok(b) = f.bool("skip_canned_menu", cm.skip_canned_menu) {
            cm.skip_canned_menu = b;
        }
        if let Ok(b) = f.bool("show_title", cm.show_title) {
            cm.show_title = b;
        }
        if let Ok(b) = f.bool("lightbar_menu", cm.lightbar_menu) {
            cm.lightbar_menu = b;
        }
        if let Ok(b) = f.bool("option_spacing", cm.option_spacing) {
            cm.option_spacing = b;
        }
        if let Ok(m) = f.int("lightbar_margin", cm.lightbar_margin.into()) {
            cm.lightbar_margin = u8::try_from(m.clamp(0, 255)).unwrap_or(u8::MAX);
        }
        if let Some(j) = f.str("option_justify").ok().as_deref().and_then(Justify::parse) {
            cm.option_justify = j;
        }
        if let Ok(s) = f.str("boundary_justify") {
            cm.set_boundary_justify(&s);
        }
        if let Some(l) = f
            .str("boundary_layout")
            .ok()
            .as_deref()
            .and_then(BoundaryLayout::parse)
        {
            cm.boundary_layout = l;
        }
        for (key, slot) in [
            ("top_boundary", &mut cm.top_boundary),
            ("bottom_boundary", &mut cm.bottom_boundary),
            ("title_location", &mut cm.title_location),
            ("prompt_location", &mut cm.prompt_location),
        ] {
            if let Some(loc) = f.int_list(key).ok().as_deref().and_then(location) {
                *slot = Some(loc);
            }
        }
        match f.raw("lightbar_color") {
            Ok(Some(ValueRef::Table(t))) => {
                let lc = Fields::of_table(t);
                let pair = |key: &str| lc.str_list(key).ok().as_deref().and_then(color_pair);
                cm.lightbar_normal = pair("normal");
                cm.lightbar_selected = pair("selected");
                cm.lightbar_high = pair("high");
                cm.lightbar_high_selected = pair("high_selected");
            }
            Ok(Some(ValueRef::StrList(items))) => {
                if let Some(attr) = color_pair(items) {
                    cm.lightbar_selected = Some(attr);
                }
            }
            _ => {}
        }
        cm
    }

    fn write(&self, w: &mut TomlWriter) {
        w.section("custom_menu")
            .bool("skip_canned_menu", self.skip_canned_menu)
            .bool("show_title", self.show_title)
            .bool("lightbar_menu", self.lightbar_menu)
            .int("lightbar_margin", self.lightbar_margin.into());
        for (key, loc) in [
            ("top_boundary", self.top_boundary),
            ("bottom_boundary", self.bottom_boundary),
            ("title_location", self.title_location),
            ("prompt_location", self.prompt_location),
        ] {
            if let Some((row, col)) = loc.filter(|&(r, c)| r > 0 && c > 0) {
                w.int_list(key, &[row.into(), col.into()]);
            }
        }

        let colors: Vec<(&str, u8)> = [
            ("normal", self.lightbar_normal),
            ("high", self.lightbar_high),
            ("selected", self.lightbar_selected),
            ("high_selected", self.lightbar_high_selected),
        ]
        .into_iter()
        .filter_map(|(k, a)| a.map(|a| (k, a)))
        .collect();
        if !colors.is_empty() {
            let mut rendered = String::from("{ ");
            for (i, (key, attr)) in colors.iter().enumerate() {
                if i > 0 {
                    rendered.push_str(", ");
                }
                let _ = write!(
                    rendered,
                    "{} = [{}, {}]",
                    key,
                    emit::escape_string(dos_color_name(attr & 0x0f)),
                    emit::escape_string(dos_color_name((attr >> 4) & 0x0f))
                );
            }
            rendered.push_str(" }");
            w.inline("lightbar_color", &rendered);
        }

        w.bool("option_spacing", self.option_spacing)
            .str("option_justify", self.option_justify.name())
            .str(
                "boundary_justify",
                &format!("{} {}", self.boundary_justify.name(), self.boundary_vjustify.name()),
            )
            .str("boundary_layout", self.boundary_layout.name());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuOption {
    pub command: String,
    pub arguments: String,
    pub priv_level: String,
    pub description: String,
    pub key_poke: String,
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub name: String,
    pub title: String,
    pub header_file: String,
    pub header_types: Vec<String>,
    pub menu_file: String,
    pub menu_types: Vec<String>,
    pub menu_length: i32,
    /// AVATAR colour, -1 for none.
    pub menu_color: i32,
    pub option_width: i32,
    pub custom_menu: Option<CustomMenu>,
    pub options: Vec<MenuOption>,
}

impl Default for Menu {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            header_file: String::new(),
            header_types: Vec::new(),
            menu_file: String::new(),
            menu_types: Vec::new(),
            menu_length: 0,
            menu_color: -1,
            option_width: 0,
            custom_menu: None,
            options: Vec::new(),
        }
    }
}

impl Menu {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        let custom_menu = match f.raw("custom_menu")? {
            Some(ValueRef::Table(t)) => Some(CustomMenu::read(&Fields::of_table(t))),
            _ => None,
        };
        let options = match f.raw("option")? {
            None => Vec::new(),
            Some(ValueRef::TableList(_)) => f
                .table_list("option")?
                .iter()
                .map(|o| {
                    Ok(MenuOption {
                        command: o.str("command")?,
                        arguments: o.str("arguments")?,
                        priv_level: o.str("priv_level")?,
                        description: o.str("description")?,
                        key_poke: o.str("key_poke")?,
                        modifiers: o.str_list("modifiers")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(ConfigError::invalid(format!(
                    "{}.option: expected table list, found {}",
                    prefix,
                    other.type_name()
                )))
            }
        };
        Ok(Self {
            name: f.str("name")?,
            title: f.str("title")?,
            header_file: f.str("header_file")?,
            header_types: f.str_list("header_types")?,
            menu_file: f.str("menu_file")?,
            menu_types: f.str_list("menu_types")?,
            menu_length: f.int("menu_length", 0)?,
            menu_color: f.int("menu_color", -1)?,
            option_width: f.int("option_width", 0)?,
            custom_menu,
            options,
        })
    }

    pub fn add_option(&mut self, opt: MenuOption) {
        self.options.push(opt);
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.str("name", &self.name)
            .str("title", &self.title)
            .str("header_file", &self.header_file)
            .str_list("header_types", &self.header_types)
            .str("menu_file", &self.menu_file)
            .str_list("menu_types", &self.menu_types)
            .int("menu_length", self.menu_length.into())
            .int("menu_color", self.menu_color.into())
            .int("option_width", self.option_width.into());
        if let Some(cm) = self.custom_menu.as_ref().filter(|cm| cm.enabled) {
            cm.write(&mut w);
        }
        for o in &self.options {
            w.list_entry("option")
                .str("command", &o.command)
                .str("arguments", &o.arguments)
                .str("priv_level", &o.priv_level)
                .str("description", &o.description)
                .str("key_poke", &o.key_poke)
                .str_list("modifiers", &o.modifiers);
        }
        w.finish()
    }
}
