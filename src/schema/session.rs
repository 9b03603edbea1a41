//! `general/session.toml`: logon, transfer and message-entry policy.

use crate::document::Document;
use crate::error::Result;

use super::{Fields, TomlWriter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub alias_system: bool,
    pub ask_alias: bool,
    pub single_word_names: bool,
    pub check_ansi: bool,
    pub check_rip: bool,
    pub ask_phone: bool,
    pub no_real_name: bool,
    pub disable_userlist: bool,
    pub disable_magnet: bool,
    pub edit_menu: String,

    pub autodate: bool,
    pub date_style: i32,
    pub filelist_margin: i32,
    pub exit_after_call: i32,

    pub chat_program: String,
    pub local_editor: String,
    pub yell_enabled: bool,
    pub compat_local_baud_9600: bool,
    pub min_free_kb: u32,
    pub upload_log: String,
    pub virus_check: String,
    pub mailchecker_reply_priv: i32,
    pub mailchecker_kill_priv: i32,
    pub comment_area: String,
    pub highest_message_area: String,
    pub highest_file_area: String,
    pub area_change_keys: String,

    pub chat_capture: bool,
    pub strict_xfer: bool,
    pub gate_netmail: bool,
    pub global_high_bit: bool,
    pub upload_check_dupe: bool,
    pub upload_check_dupe_extension: bool,
    pub use_umsgids: bool,

    pub logon_priv: i32,
    pub logon_timelimit: i32,
    pub min_logon_baud: i32,
    pub min_graphics_baud: i32,
    pub min_rip_baud: i32,
    pub input_timeout: i32,

    pub max_msgsize: u32,
    pub kill_private: String,
    pub charset: String,
    pub save_directories: Vec<String>,

    pub track_privview: String,
    pub track_privmod: String,
    pub track_base: String,
    pub track_exclude: String,
    pub attach_base: String,
    pub attach_path: String,
    pub attach_archiver: String,
    pub kill_attach: String,
    pub msg_localattach_priv: i32,
    pub kill_attach_priv: i32,

    pub first_menu: String,
    pub first_file_area: String,
    pub first_message_area: String,
}

impl Session {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        Ok(Self {
            alias_system: f.bool("alias_system", false)?,
            ask_alias: f.bool("ask_alias", false)?,
            single_word_names: f.bool("single_word_names", false)?,
            check_ansi: f.bool("check_ansi", false)?,
            check_rip: f.bool("check_rip", false)?,
            ask_phone: f.bool("ask_phone", false)?,
            no_real_name: f.bool("no_real_name", false)?,
            disable_userlist: f.bool("disable_userlist", false)?,
            disable_magnet: f.bool("disable_magnet", false)?,
            edit_menu: f.str("edit_menu")?,
            autodate: f.bool("autodate", false)?,
            date_style: f.int("date_style", 0)?,
            filelist_margin: f.int("filelist_margin", 0)?,
            exit_after_call: f.int("exit_after_call", 0)?,
            chat_program: f.str("chat_program")?,
            local_editor: f.str("local_editor")?,
            yell_enabled: f.bool("yell_enabled", false)?,
            compat_local_baud_9600: f.bool("compat_local_baud_9600", false)?,
            min_free_kb: f.uint("min_free_kb", 0)?,
            upload_log: f.str("upload_log")?,
            virus_check: f.str("virus_check")?,
            mailchecker_reply_priv: f.int("mailchecker_reply_priv", 0)?,
            mailchecker_kill_priv: f.int("mailchecker_kill_priv", 0)?,
            comment_area: f.str("comment_area")?,
            highest_message_area: f.str("highest_message_area")?,
            highest_file_area: f.str("highest_file_area")?,
            area_change_keys: f.str("area_change_keys")?,
            chat_capture: f.bool("chat_capture", false)?,
            strict_xfer: f.bool("strict_xfer", false)?,
            gate_netmail: f.bool("gate_netmail", false)?,
            global_high_bit: f.bool("global_high_bit", false)?,
            upload_check_dupe: f.bool("upload_check_dupe", false)?,
            upload_check_dupe_extension: f.bool("upload_check_dupe_extension", false)?,
            use_umsgids: f.bool("use_umsgids", false)?,
            logon_priv: f.int("logon_priv", 0)?,
            logon_timelimit: f.int("logon_timelimit", 0)?,
            min_logon_baud: f.int("min_logon_baud", 0)?,
            min_graphics_baud: f.int("min_graphics_baud", 0)?,
            min_rip_baud: f.int("min_rip_baud", 0)?,
            input_timeout: f.int("input_timeout", 0)?,
            max_msgsize: f.uint("max_msgsize", 0)?,
            kill_private: f.str("kill_private")?,
            charset: f.str("charset")?,
            save_directories: f.str_list("save_directories")?,
            track_privview: f.str("track_privview")?,
            track_privmod: f.str("track_privmod")?,
            track_base: f.str("track_base")?,
            track_exclude: f.str("track_exclude")?,
            attach_base: f.str("attach_base")?,
            attach_path: f.str("attach_path")?,
            attach_archiver: f.str("attach_archiver")?,
            kill_attach: f.str("kill_attach")?,
            msg_localattach_priv: f.int("msg_localattach_priv", 0)?,
            kill_attach_priv: f.int("kill_attach_priv", 0)?,
            first_menu: f.str("first_menu")?,
            first_file_area: f.str("first_file_area")?,
            first_message_area: f.str("first_message_area")?,
        })
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.bool("alias_system", self.alias_system)
            .bool("ask_alias", self.ask_alias)
            .bool("single_word_names", self.single_word_names)
            .bool("check_ansi", self.check_ansi)
            .bool("check_rip", self.check_rip)
            .bool("ask_phone", self.ask_phone)
            .bool("no_real_name", self.no_real_name)
            .bool("disable_userlist", self.disable_userlist)
            .bool("disable_magnet", self.disable_magnet)
            .str("edit_menu", &self.edit_menu)
            .bool("autodate", self.autodate)
            .int("date_style", self.date_style.into())
            .int("filelist_margin", self.filelist_margin.into())
            .int("exit_after_call", self.exit_after_call.into())
            .str("chat_program", &self.chat_program)
            .str("local_editor", &self.local_editor)
            .bool("yell_enabled", self.yell_enabled)
            .bool("compat_local_baud_9600", self.compat_local_baud_9600)
            .uint("min_free_kb", self.min_free_kb.into())
            .str("upload_log", &self.upload_log)
            .str("virus_check", &self.virus_check)
            .int("mailchecker_reply_priv", self.mailchecker_reply_priv.into())
            .int("mailchecker_kill_priv", self.mailchecker_kill_priv.into())
            .str("comment_area", &self.comment_area)
            .str("highest_message_area", &self.highest_message_area)
            .str("highest_file_area", &self.highest_file_area)
            .str("area_change_keys", &self.area_change_keys)
            .bool("chat_capture", self.chat_capture)
            .bool("strict_xfer", self.strict_xfer)
            .bool("gate_netmail", self.gate_netmail)
            .bool("global_high_bit", self.global_high_bit)
            .bool("upload_check_dupe", self.upload_check_dupe)
            .bool("upload_check_dupe_extension", self.upload_check_dupe_extension)
            .bool("use_umsgids", self.use_umsgids)
            .int("logon_priv", self.logon_priv.into())
            .int("logon_timelimit", self.logon_timelimit.into())
            .int("min_logon_baud", self.min_logon_baud.into())
            .int("min_graphics_baud", self.min_graphics_baud.into())
            .int("min_rip_baud", self.min_rip_baud.into())
            .int("input_timeout", self.input_timeout.into())
            .uint("max_msgsize", self.max_msgsize.into())
            .str("kill_private", &self.kill_private)
            .str("charset", &self.charset)
            .str_list("save_directories", &self.save_directories)
            .str("track_privview", &self.track_privview)
            .str("track_privmod", &self.track_privmod)
            .str("track_base", &self.track_base)
            .str("track_exclude", &self.track_exclude)
            .str("attach_base", &self.attach_base)
            .str("attach_path", &self.attach_path)
            .str("attach_archiver", &self.attach_archiver)
            .str("kill_attach", &self.kill_attach)
            .int("msg_localattach_priv", self.msg_localattach_priv.into())
            .int("kill_attach_priv", self.kill_attach_priv.into())
            .str("first_menu", &self.first_menu)
            .str("first_file_area", &self.first_file_area)
            .str("first_message_area", &self.first_message_area);
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::value::parse_str;

    #[test]
    fn test_round_trip() {
        let s = Session {
            alias_system: true,
            edit_menu: "EDIT".into(),
            date_style: 2,
            yell_enabled: true,
            min_free_kb: 500,
            logon_priv: 30,
            max_msgsize: 16384,
            charset: "swedish".into(),
            save_directories: vec!["C".into(), "D".into()],
            track_base: "trk".into(),
            first_menu: "MAIN".into(),
            ..Session::default()
        };
        let text = s.to_toml();
        assert!(text.starts_with("alias_system = true\nask_alias = false\n"));
        let mut doc = Document::new();
        doc.mount(parse_str(&text, "session.toml").unwrap(), "general.session")
            .unwrap();
        assert_eq!(Session::from_document(&doc, "general.session").unwrap(), s);
    }

    #[test]
    fn test_negative_unsigned_is_rejected() {
        let mut doc = Document::new();
        doc.mount(parse_str("min_free_kb = -5\n", "t").unwrap(), "general.session")
            .unwrap();
        assert!(matches!(
            Session::from_document(&doc, "general.session"),
            Err(ConfigError::InvalidArgument(_))
        ));
    }
}
