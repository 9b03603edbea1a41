//! Classic colour slots from `etc/lang/colors.lh`.
//!
//! Each slot is a C define whose string literal carries an AVATAR colour
//! sequence, e.g. `#define COL_MNU_NAME "\x16\x01\x0e"`. A trailing
//! `\x16\x02` marks the colour as blinking.

use std::collections::HashSet;
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::fsutil;
use crate::schema::{Color, Colors};

const ATTR_PREFIX: &str = r"\x16\x01\x";
const BLINK: &str = r"\x16\x02";

/// Define name to `(section, key)` slot.
const DEFINES: [(&str, &str, &str); 32] = [
    ("COL_MNU_NAME", "menu", "name"),
    ("COL_MNU_HILITE", "menu", "highlight"),
    ("COL_MNU_OPTION", "menu", "option"),
    ("COL_FILE_NAME", "file", "name"),
    ("COL_FILE_SIZE", "file", "size"),
    ("COL_FILE_DATE", "file", "date"),
    ("COL_FILE_DESC", "file", "description"),
    ("COL_FILE_FIND", "file", "search_match"),
    ("COL_FILE_OFFLN", "file", "offline"),
    ("COL_FILE_NEW", "file", "new"),
    ("COL_MSG_FROM", "msg", "from_label"),
    ("COL_MSG_FROMTXT", "msg", "from_text"),
    ("COL_MSG_TO", "msg", "to_label"),
    ("COL_MSG_TOTXT", "msg", "to_text"),
    ("COL_MSG_SUBJ", "msg", "subject_label"),
    ("COL_MSG_SUBJTXT", "msg", "subject_text"),
    ("COL_MSG_ATTR", "msg", "attributes"),
    ("COL_MSG_DATE", "msg", "date"),
    ("COL_MSG_ADDR", "msg", "address"),
    ("COL_MSG_LOCUS", "msg", "locus"),
    ("COL_MSG_BODY", "msg", "body"),
    ("COL_MSG_QUOTE", "msg", "quote"),
    ("COL_MSG_KLUDGE", "msg", "kludge"),
    ("COL_FSR_MSGNUM", "fsr", "msgnum"),
    ("COL_FSR_LINKS", "fsr", "links"),
    ("COL_FSR_ATTRIB", "fsr", "attrib"),
    ("COL_FSR_MSGINFO", "fsr", "msginfo"),
    ("COL_FSR_DATE", "fsr", "date"),
    ("COL_FSR_ADDR", "fsr", "addr"),
    ("COL_FSR_STATIC", "fsr", "static"),
    ("COL_FSR_BORDER", "fsr", "border"),
    ("COL_FSR_LOCUS", "fsr", "locus"),
];

/// Colour carried by one define line, if it has the attribute sequence.
fn define_color(line: &str) -> Option<Color> {
    let (_, after) = line.split_once(ATTR_PREFIX)?;
    let hex = after.get(..2)?;
    let byte = u8::from_str_radix(hex, 16).ok()?;
    let mut c = Color::from_attr(byte);
    c.blink = line.contains(BLINK);
    Some(c)
}

/// Applies every known define in `text` to a copy of the defaults. Only the
/// first define of each name counts.
pub fn read_colors_lh(text: &str) -> Colors {
    let mut colors = Colors::default();
    let mut seen = HashSet::new();
    for line in text.lines() {
        let Some(rest) = line.strip_prefix("#define") else {
            continue;
        };
        let Some(name) = rest.split_whitespace().next() else {
            continue;
        };
        let Some(&(_, section, key)) = DEFINES.iter().find(|(d, _, _)| *d == name) else {
            continue;
        };
        if !seen.insert(name) {
            continue;
        }
        if let (Some(c), Some(slot)) = (define_color(line), colors.slot_mut(section, key)) {
            *slot = c;
        }
    }
    colors
}

/// Colours from `<sys>/etc/lang/colors.lh`; defaults if the file is absent.
pub fn parse_colors_lh(sys_dir: &Path) -> Result<Colors> {
    let path = sys_dir.join("etc").join("lang").join("colors.lh");
    match fsutil::read_text_opt(&path)? {
        Some(text) => {
            debug!("reading {}", path.display());
            Ok(read_colors_lh(&text))
        }
        None => Ok(Colors::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
/* colour definitions */
#define COL_MNU_NAME      "\x16\x01\x0e"
#define COL_MNU_HILITE    "\x16\x01\x1f\x16\x02"
#define COL_FILE_NEW      "\x16\x01\x8c"
#define COL_MSG_BODY      "plain"
#define COL_MNU_NAME      "\x16\x01\x01"
#define COL_UNKNOWN       "\x16\x01\x04"
  #define COL_FSR_DATE    "\x16\x01\x04"
"#;

    #[test]
    fn test_defines_map_to_slots() {
        let c = read_colors_lh(SAMPLE);
        assert_eq!(c.menu_name, Color::new(14, 0, false));
        assert_eq!(c.menu_highlight, Color::new(15, 1, true));
        // blink comes from the trailing sequence, not the attribute's high bit
        assert_eq!(c.file_new, Color::new(12, 0, false));
        assert_eq!(c.msg_body, Color::default());
        assert_eq!(c.fsr_date, Color::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(parse_colors_lh(dir.path()).unwrap(), Colors::default());
    }
}
