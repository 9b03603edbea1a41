//! Semantic colour theme: two-letter `|xx` codes mapped to pipe-colour strings.

use log::warn;

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::schema::Fields;
use crate::value::emit::escape_string;

const DEFAULT_NAME: &str = "Classic Maximus";

// (code, key, default, description)
const SLOTS: [(&str, &str, &str, &str); 19] = [
    ("tx", "text", "|07", "Normal body text"),
    ("hi", "highlight", "|15", "Emphasized text"),
    ("pr", "prompt", "|14", "User-facing prompts"),
    ("in", "input", "|15", "User keystroke echo"),
    ("tf", "textbox_fg", "|15", "Text input field foreground"),
    ("tb", "textbox_bg", "|17", "Text input field background"),
    ("hd", "heading", "|11", "Section headings"),
    ("lf", "lightbar_fg", "|15", "Lightbar selected foreground"),
    ("lb", "lightbar_bg", "|17", "Lightbar selected background"),
    ("er", "error", "|12", "Error messages"),
    ("wn", "warning", "|14", "Warnings"),
    ("ok", "success", "|10", "Confirmations"),
    ("dm", "dim", "|08", "De-emphasized/help text"),
    ("fi", "file_info", "|03", "File descriptions"),
    ("sy", "sysop", "|13", "SysOp-only text"),
    ("qt", "quote", "|09", "Quoted message text"),
    ("br", "border", "|01", "Box borders, dividers"),
    ("hk", "hotkey", "|14", "Hotkey characters"),
    ("cd", "default", "|16|07", "Reset to default theme color"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSlot {
    pub code: &'static str,
    pub key: &'static str,
    pub value: String,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    slots: Vec<ThemeSlot>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            slots: SLOTS
                .iter()
                .map(|&(code, key, value, description)| ThemeSlot {
                    code,
                    key,
                    value: value.to_string(),
                    description,
                })
                .collect(),
        }
    }
}

/// True when `value` holds a `|xx` lowercase reference.
fn has_theme_reference(value: &str) -> bool {
    let b = value.as_bytes();
    let mut i = 0;
    while i + 2 < b.len() {
        if b[i] == b'|' && b[i + 1] == b'|' {
            i += 2;
            continue;
        }
        if b[i] == b'|' && b[i + 1].is_ascii_lowercase() && b[i + 2].is_ascii_lowercase() {
            return true;
        }
        i += 1;
    }
    false
}

impl Theme {
    pub fn slots(&self) -> &[ThemeSlot] {
        &self.slots
    }

    /// Expansion for the `|ab` code, if `ab` names a slot.
    pub fn lookup(&self, a: char, b: char) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| {
                let mut c = s.code.chars();
                c.next() == Some(a) && c.next() == Some(b)
            })
            .map(|s| s.value.as_str())
    }

    /// Value for a slot by its long key (`text`, `heading`, ...).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.as_str())
    }

    /// Replaces a slot value. Values may only carry numeric pipe codes.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if has_theme_reference(value) {
            return Err(ConfigError::invalid(format!(
                "theme slot '{}' may not reference another theme code",
                key
            )));
        }
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.key == key)
            .ok_or_else(|| ConfigError::not_found(format!("theme slot '{}'", key)))?;
        slot.value = value.to_string();
        Ok(())
    }

    /// Reads `<prefix>.theme`; absent keys keep their defaults.
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let mut theme = Self::default();
        let root = match Fields::of_document(doc, prefix) {
            Ok(f) => f,
            Err(ConfigError::NotFound(_)) => return Ok(theme),
            Err(e) => return Err(e),
        };
        let Some(section) = root.table("theme")? else {
            return Ok(theme);
        };
        theme.name = section.str_or("name", DEFAULT_NAME)?;
        let Some(colors) = section.table("colors")? else {
            return Ok(theme);
        };
        for slot in theme.slots.iter_mut() {
            if !colors.contains(slot.key)? {
                continue;
            }
            let value = colors.str(slot.key)?;
            if has_theme_reference(&value) {
                warn!(
                    "theme.colors.{}: value '{}' references another theme code, keeping {}",
                    slot.key, value, slot.value
                );
                continue;
            }
            slot.value = value;
        }
        Ok(theme)
    }

    /// `[theme]` and `[theme.colors]` blocks with aligned slot comments.
    pub fn to_toml(&self) -> String {
        let mut out = format!(
            "[theme]\nname = {}\n\n[theme.colors]\n",
            escape_string(&self.name)
        );
        for s in &self.slots {
            // quoted value padded so the comments line up
            let value = escape_string(&s.value);
            let pad = " ".repeat(10usize.saturating_sub(value.chars().count()).max(1));
            out.push_str(&format!(
                "{:<12} = {}{}# |{} - {}\n",
                s.key, value, pad, s.code, s.description
            ));
        }
        out
    }
}
