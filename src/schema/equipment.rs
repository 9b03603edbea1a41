//! `general/equipment.toml`: modem and serial port settings.

use crate::document::Document;
use crate::error::Result;

use super::enums::{parse_handshaking_token, Handshake};
use super::{Fields, TomlWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equipment {
    pub output: String,
    pub com_port: i32,
    pub baud_maximum: i32,
    pub busy: String,
    pub init: String,
    pub ring: String,
    pub answer: String,
    pub connect: String,
    pub carrier_mask: i32,
    pub handshaking: Vec<String>,
    pub send_break: bool,
    pub no_critical: bool,
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            output: "com".to_string(),
            com_port: 1,
            baud_maximum: 0,
            busy: String::new(),
            init: String::new(),
            ring: String::new(),
            answer: String::new(),
            connect: String::new(),
            carrier_mask: 0,
            handshaking: Vec::new(),
            send_break: false,
            no_critical: false,
        }
    }
}

impl Equipment {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        let d = Self::default();
        Ok(Self {
            output: f.str_or("output", &d.output)?,
            com_port: f.int("com_port", d.com_port)?,
            baud_maximum: f.int("baud_maximum", 0)?,
            busy: f.str("busy")?,
            init: f.str("init")?,
            ring: f.str("ring")?,
            answer: f.str("answer")?,
            connect: f.str("connect")?,
            carrier_mask: f.int("carrier_mask", 0)?,
            handshaking: f.str_list("handshaking")?,
            send_break: f.bool("send_break", false)?,
            no_critical: f.bool("no_critical", false)?,
        })
    }

    /// OR of the handshaking tokens; an unknown token is an error.
    pub fn handshake_mask(&self) -> Result<Handshake> {
        self.handshaking
            .iter()
            .try_fold(Handshake::empty(), |acc, t| Ok(acc | parse_handshaking_token(t)?))
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.str("output", &self.output)
            .int("com_port", self.com_port.into())
            .int("baud_maximum", self.baud_maximum.into())
            .str("busy", &self.busy)
            .str("init", &self.init)
            .str("ring", &self.ring)
            .str("answer", &self.answer)
            .str("connect", &self.connect)
            .int("carrier_mask", self.carrier_mask.into())
            .str_list("handshaking", &self.handshaking)
            .bool("send_break", self.send_break)
            .bool("no_critical", self.no_critical);
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::parse_str;

    #[test]
    fn test_round_trip_and_mask() {
        let e = Equipment {
            baud_maximum: 38400,
            init: "ATZ|".into(),
            carrier_mask: 128,
            handshaking: vec!["cts".into(), "dsr".into()],
            send_break: true,
            ..Equipment::default()
        };
        assert_eq!(e.handshake_mask().unwrap(), Handshake::CTS | Handshake::DSR);

        let text = e.to_toml();
        assert!(text.contains("handshaking = [\"cts\", \"dsr\"]\n"));
        let mut doc = Document::new();
        doc.mount(parse_str(&text, "t").unwrap(), "general.equipment").unwrap();
        assert_eq!(Equipment::from_document(&doc, "general.equipment").unwrap(), e);
    }

    #[test]
    fn test_defaults_when_empty() {
        let mut doc = Document::new();
        doc.mount(parse_str("", "t").unwrap(), "general.equipment").unwrap();
        let e = Equipment::from_document(&doc, "general.equipment").unwrap();
        assert_eq!(e.output, "com");
        assert_eq!(e.com_port, 1);
    }
}
