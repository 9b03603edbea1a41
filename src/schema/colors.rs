//! Classic colour settings (`general/colors.toml`) and DOS colour helpers.

use std::fmt::Write as _;

use crate::document::Document;
use crate::error::Result;
use crate::mci;

use super::{Fields, TomlWriter};

const DOS_COLOR_NAMES: [&str; 16] = [
    "Black",
    "Blue",
    "Green",
    "Cyan",
    "Red",
    "Magenta",
    "Brown",
    "Light Gray",
    "Dark Gray",
    "Light Blue",
    "Light Green",
    "Light Cyan",
    "Light Red",
    "Light Magenta",
    "Yellow",
    "White",
];

/// Parses a DOS colour name. Case, spaces, tabs, `_` and `-` are ignored;
/// `grey` and `gray` are both accepted.
pub fn dos_color_from_name(s: &str) -> Option<u8> {
    let folded: String = s
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let idx = match folded.as_str() {
        "black" => 0,
        "blue" => 1,
        "green" => 2,
        "cyan" => 3,
        "red" => 4,
        "magenta" => 5,
        "brown" => 6,
        "lightgray" | "lightgrey" => 7,
        "darkgray" | "darkgrey" => 8,
        "lightblue" => 9,
        "lightgreen" => 10,
        "lightcyan" => 11,
        "lightred" => 12,
        "lightmagenta" => 13,
        "yellow" => 14,
        "white" => 15,
        _ => return None,
    };
    Some(idx)
}

/// Display name for a colour index; empty for anything above 15.
pub fn dos_color_name(color: u8) -> &'static str {
    DOS_COLOR_NAMES.get(usize::from(color)).copied().unwrap_or("")
}

pub fn make_attr(fg: u8, bg: u8) -> u8 {
    (fg & 0x0f) | ((bg & 0x0f) << 4)
}

/// Foreground 0-15, background 0-7, blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub fg: u8,
    pub bg: u8,
    pub blink: bool,
}

impl Color {
    pub fn new(fg: u8, bg: u8, blink: bool) -> Self {
        Self {
            fg: fg & 0x0f,
            bg: bg & 0x07,
            blink,
        }
    }

    /// Splits a DOS attribute byte.
    pub fn from_attr(attr: u8) -> Self {
        Self::new(attr & 0x0f, (attr >> 4) & 0x07, attr & 0x80 != 0)
    }

    pub fn attr(self) -> u8 {
        (self.fg & 0x0f) | ((self.bg & 0x07) << 4) | if self.blink { 0x80 } else { 0 }
    }

    /// Pipe form: `|FF`, then `|(24+bg)` when blinking or `|(16+bg)` for a
    /// non-black background.
    pub fn to_mci(self) -> String {
        let mut out = format!("|{:02}", self.fg & 0x0f);
        let bg = self.bg & 0x07;
        if self.blink {
            let _ = write!(out, "|{:02}", 24 + bg);
        } else if bg > 0 {
            let _ = write!(out, "|{:02}", 16 + bg);
        }
        out
    }

    /// Inverse of [`Color::to_mci`]; non-numeric codes are ignored.
    pub fn from_mci(s: &str) -> Self {
        Self::from_attr(mci::attr::pipe_attr(s, 0))
    }
}

macro_rules! color_sections {
    ($( $section:literal { $( $field:ident = $key:literal ),* $(,)? } )*) => {
        /// Every classic colour slot, grouped by section.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct Colors {
            $( $( pub $field: Color, )* )*
        }

        impl Colors {
            fn write_sections(&self, w: &mut TomlWriter) {
                $(
                    w.section($section);
                    $( w.str($key, &self.$field.to_mci()); )*
                )*
            }

            fn read_sections(f: &Fields<'_>) -> Result<Self> {
                let mut out = Colors::default();
                $(
                    if let Some(sec) = f.table($section)? {
                        $(
                            if sec.contains($key)? {
                                out.$field = Color::from_mci(&sec.str($key)?);
                            }
                        )*
                    }
                )*
                Ok(out)
            }

            /// Slot addressed by `(section, key)` as written in the file.
            pub fn slot_mut(&mut self, section: &str, key: &str) -> Option<&mut Color> {
                match (section, key) {
                    $( $( ($section, $key) => Some(&mut self.$field), )* )*
                    _ => None,
                }
            }
        }
    };
}

color_sections! {
    "menu" {
        menu_name = "name",
        menu_highlight = "highlight",
        menu_option = "option",
    }
    "file" {
        file_name = "name",
        file_size = "size",
        file_date = "date",
        file_description = "description",
        file_search_match = "search_match",
        file_offline = "offline",
        file_new = "new",
    }
    "msg" {
        msg_from_label = "from_label",
        msg_from_text = "from_text",
        msg_to_label = "to_label",
        msg_to_text = "to_text",
        msg_subject_label = "subject_label",
        msg_subject_text = "subject_text",
        msg_attributes = "attributes",
        msg_date = "date",
        msg_address = "address",
        msg_locus = "locus",
        msg_body = "body",
        msg_quote = "quote",
        msg_kludge = "kludge",
    }
    "fsr" {
        fsr_msgnum = "msgnum",
        fsr_links = "links",
        fsr_attrib = "attrib",
        fsr_msginfo = "msginfo",
        fsr_date = "date",
        fsr_addr = "addr",
        fsr_static = "static",
        fsr_border = "border",
        fsr_locus = "locus",
    }
}

impl Colors {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        Self::read_sections(&Fields::of_document(doc, prefix)?)
    }

    /// Classic sections followed by the built-in `[theme]` block.
    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        self.write_sections(&mut w);
        w.raw("\n");
        w.raw(&mci::Theme::default().to_toml());
        w.finish()
    }
}
