//! `general/display_files.toml`: names of the display files shown at fixed
//! points of a session.

use crate::document::Document;
use crate::error::Result;

use super::{Fields, TomlWriter};

macro_rules! display_files {
    ($( $field:ident => $ctl:literal ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct DisplayFiles {
            $( pub $field: String, )*
        }

        impl DisplayFiles {
            /// `(toml key, max.ctl keyword)` for every field, in file order.
            pub const KEYWORDS: &'static [(&'static str, &'static str)] = &[
                $( (stringify!($field), $ctl), )*
            ];

            pub fn field_mut(&mut self, key: &str) -> Option<&mut String> {
                match key {
                    $( stringify!($field) => Some(&mut self.$field), )*
                    _ => None,
                }
            }

            pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
                let f = Fields::of_document(doc, prefix)?;
                Ok(Self {
                    $( $field: f.str(stringify!($field))?, )*
                })
            }

            pub fn to_toml(&self) -> String {
                let mut w = TomlWriter::new();
                $( w.str(stringify!($field), &self.$field); )*
                w.finish()
            }
        }
    };
}

display_files! {
    logo => "Uses Logo",
    not_found => "Uses NotFound",
    application => "Uses Application",
    welcome => "Uses Welcome",
    new_user1 => "Uses NewUser1",
    new_user2 => "Uses NewUser2",
    rookie => "Uses Rookie",
    not_configured => "Uses Configure",
    quote => "Uses Quote",
    day_limit => "Uses DayLimit",
    time_warn => "Uses TimeWarn",
    too_slow => "Uses TooSlow",
    bye_bye => "Uses ByeBye",
    bad_logon => "Uses BadLogon",
    barricade => "Uses Barricade",
    no_space => "Uses NoSpace",
    no_mail => "Uses NoMail",
    area_not_exist => "Uses Cant_Enter_Area",
    chat_begin => "Uses BeginChat",
    chat_end => "Uses EndChat",
    out_leaving => "Uses Leaving",
    out_return => "Uses Returning",
    shell_to_dos => "Uses Shell_Leaving",
    back_from_dos => "Uses Shell_Returning",
    locate => "Uses LocateHelp",
    contents => "Uses ContentsHelp",
    oped_help => "Uses MaxEdHelp",
    line_ed_help => "Uses BOREDhelp",
    replace_help => "Uses ReplaceHelp",
    inquire_help => "Uses InquireHelp",
    scan_help => "Uses ScanHelp",
    list_help => "Uses ListHelp",
    header_help => "Uses HeaderHelp",
    entry_help => "Uses EntryHelp",
    xfer_baud => "Uses XferBaud",
    file_area_list => "Uses FileAreas",
    file_header => "Format FileHeader",
    file_format => "Format FileFormat",
    file_footer => "Format FileFooter",
    msg_area_list => "Uses MsgAreas",
    msg_header => "Format MsgHeader",
    msg_format => "Format MsgFormat",
    msg_footer => "Format MsgFooter",
    protocol_dump => "Uses ProtocolDump",
    fname_format => "Uses Filename_Format",
    time_format => "Format Time",
    date_format => "Format Date",
    tune => "Uses Tunes",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::parse_str;

    #[test]
    fn test_keyword_table_covers_every_field() {
        let mut files = DisplayFiles::default();
        assert_eq!(DisplayFiles::KEYWORDS.len(), 48);
        for (key, _) in DisplayFiles::KEYWORDS {
            assert!(files.field_mut(key).is_some(), "{}", key);
        }
        assert_eq!(DisplayFiles::KEYWORDS[0], ("logo", "Uses Logo"));
    }

    #[test]
    fn test_round_trip() {
        let files = DisplayFiles {
            logo: "misc/logo".into(),
            line_ed_help: "misc/bored".into(),
            tune: "etc/tunes".into(),
            ..DisplayFiles::default()
        };
        let text = files.to_toml();
        assert!(text.starts_with("logo = \"misc/logo\"\nnot_found = \"\"\n"));
        assert!(text.ends_with("tune = \"etc/tunes\"\n"));
        let mut doc = Document::new();
        doc.mount(parse_str(&text, "t").unwrap(), "general.display_files")
            .unwrap();
        assert_eq!(
            DisplayFiles::from_document(&doc, "general.display_files").unwrap(),
            files
        );
    }
}
