//! `etc/max.ctl`: the main system control file.
//!
//! One file feeds several views: the system block, session policy, display
//! file names, the matrix (netmail) block, equipment and, when there is no
//! `etc/reader.ctl`, the offline reader settings. Privilege names are
//! resolved through `etc/access.ctl`.

use std::path::Path;

use log::{debug, warn};

use crate::error::Result;
use crate::logutil::escape_log;
use crate::schema::enums::{atoi, parse_charset, parse_handshaking_token};
use crate::schema::{
    AccessLevels, AttributePriv, DisplayFiles, Equipment, Matrix, NetAddress, Reader, Session,
    System,
};

use super::{access::parse_access_ctl, split_word, CtlFile};

/// Message attributes accepted on `Message Edit Ask/Assume` lines.
const EDIT_ATTRIBUTES: [&str; 8] = [
    "private",
    "crash",
    "fileattach",
    "killsent",
    "hold",
    "filerequest",
    "updaterequest",
    "localattach",
];

fn fill(dst: &mut String, value: Option<&str>) {
    if let Some(v) = value {
        *dst = v.to_string();
    }
}

fn fill_int(dst: &mut i32, value: Option<i32>) {
    if let Some(v) = value {
        *dst = v;
    }
}

/// Leading signed integer of `s`, if it starts with one.
fn leading_int(s: &str) -> Option<i32> {
    let t = s.trim_start();
    let digits = t.strip_prefix(['-', '+']).unwrap_or(t);
    digits.starts_with(|c: char| c.is_ascii_digit()).then(|| atoi(t))
}

pub struct MaxCtl {
    ctl: CtlFile,
    levels: AccessLevels,
}

impl MaxCtl {
    /// Reads `<sys>/etc/max.ctl` and the access classes used to resolve
    /// privilege names. Both files may be missing.
    pub fn load(sys_dir: &Path) -> Result<Self> {
        let ctl = CtlFile::load(&sys_dir.join("etc").join("max.ctl"))?;
        let levels = parse_access_ctl(&sys_dir.join("etc").join("access.ctl"))?;
        Ok(Self::new(ctl, levels))
    }

    pub fn new(ctl: CtlFile, levels: AccessLevels) -> Self {
        Self { ctl, levels }
    }

    pub fn ctl(&self) -> &CtlFile {
        &self.ctl
    }

    pub fn exists(&self) -> bool {
        self.ctl.exists()
    }

    pub fn levels(&self) -> &AccessLevels {
        &self.levels
    }

    fn priv_of(&self, kw: &str) -> Option<i32> {
        self.ctl.find(kw).map(|v| self.levels.priv_level(v))
    }

    pub fn system(&self, sys_path: &str, config_path: &str) -> System {
        let c = &self.ctl;
        let mut s = System {
            sys_path: sys_path.to_string(),
            config_path: config_path.to_string(),
            ..System::default()
        };

        fill(&mut s.system_name, c.find("Name"));
        fill(&mut s.sysop, c.find("SysOp"));
        fill_int(&mut s.task_num, c.int("Task"));
        fill(&mut s.video, c.find("Video"));
        fill(&mut s.multitasker, c.find("Multitasker"));

        fill(&mut s.misc_path, c.find("Path Misc"));
        fill(&mut s.lang_path, c.find("Path Language"));
        fill(&mut s.temp_path, c.find("Path Temp"));
        fill(&mut s.net_info_path, c.find("Path NetInfo"));
        fill(&mut s.ipc_path, c.find("Path IPC"));
        fill(&mut s.inbound_path, c.find("Path Inbound"));
        fill(&mut s.menu_path, c.find_any(&["Menu Path", "Path Menu"]));
        fill(&mut s.rip_path, c.find_any(&["RIP Path", "Path RIP"]));
        fill(&mut s.stage_path, c.find_any(&["Stage Path", "Path Stage"]));

        fill(&mut s.log_file, c.find("Log File"));
        fill(&mut s.log_mode, c.find("Log Mode"));
        fill(&mut s.file_callers, c.find_any(&["File Callers", "Uses Callers"]));
        fill(&mut s.file_password, c.find("File Password"));
        fill(&mut s.file_access, c.find("File Access"));
        fill(&mut s.protocol_ctl, c.find("Protocol CTL"));
        fill(&mut s.message_data, c.find("MessageData"));
        fill(&mut s.file_data, c.find("FileData"));
        fill(&mut s.mcp_pipe, c.find("MCP Pipe"));
        fill_int(&mut s.mcp_sessions, c.int("MCP Sessions"));

        s.snoop = c.bool("Snoop");
        s.no_password_encryption = c.bool("No Password");
        s.no_share = c.bool("No Share");
        s.reboot = c.bool("Reboot");
        s.swap = c.bool("Swap");
        s.dos_close = c.bool("DOS Close");
        s.local_input_timeout = c.bool("Local Input");
        s.status_line = c.bool("StatusLine");
        s.has_snow = c.bool("Has Snow");
        s
    }

    pub fn session(&self) -> Session {
        let c = &self.ctl;
        let mut s = Session {
            yell_enabled: true,
            ..Session::default()
        };

        s.alias_system = c.bool("Alias System");
        s.ask_alias = c.bool("Ask Alias");
        s.single_word_names = c.bool("Single Word Names");
        s.check_ansi = c.bool("Check ANSI");
        s.check_rip = c.bool("Check RIP");
        s.ask_phone = c.bool("Ask Phone");
        s.no_real_name = c.bool("No Real Name");
        s.disable_userlist = c.bool("Disable Userlist");
        s.disable_magnet = c.bool("Disable Magnet");

        if let Some(v) = c.find("File Date") {
            let (mode, format) = split_word(v);
            s.autodate = mode.eq_ignore_ascii_case("Automatic");
            match format.to_ascii_lowercase().as_str() {
                "mm-dd-yy" => s.date_style = 0,
                "dd-mm-yy" => s.date_style = 1,
                "yy-mm-dd" => s.date_style = 2,
                "yymmdd" => s.date_style = 3,
                _ => {}
            }
        }
        if c.find("Yell").is_some_and(|v| v.eq_ignore_ascii_case("Off")) {
            s.yell_enabled = false;
        }

        s.chat_capture = c.bool("Chat Capture");
        s.strict_xfer = c.bool("Strict Transfer");
        s.gate_netmail = c.bool("Gate Netmail");
        s.global_high_bit = c.bool("Global High Bit");
        s.upload_check_dupe = c.has("Upload Check Dupe");
        s.upload_check_dupe_extension = c.bool("Check Dupe Ext");
        s.use_umsgids = c.bool("Use UMSGIDs");
        s.compat_local_baud_9600 = c.bool("Local Baud 9600");

        fill(&mut s.edit_menu, c.find("Edit Menu"));
        fill(&mut s.chat_program, c.find("Chat Program"));
        fill(&mut s.local_editor, c.find("Local Editor"));
        fill(&mut s.upload_log, c.find("Upload Log"));
        fill(&mut s.virus_check, c.find("Virus Check"));
        fill(&mut s.comment_area, c.find("Comment Area"));
        fill(&mut s.highest_message_area, c.find("Highest MsgArea"));
        fill(&mut s.highest_file_area, c.find("Highest FileArea"));
        fill(&mut s.area_change_keys, c.find("Area Change Keys"));
        fill(&mut s.charset, c.find("Charset"));
        fill(&mut s.track_privview, c.find("Track PrivView"));
        fill(&mut s.track_privmod, c.find("Track PrivMod"));
        fill(&mut s.track_base, c.find("Track Base"));
        fill(&mut s.track_exclude, c.find("Track Exclude"));
        fill(&mut s.attach_base, c.find("Attach Base"));
        fill(&mut s.attach_path, c.find("Attach Path"));
        fill(&mut s.attach_archiver, c.find("Attach Archiver"));
        fill(&mut s.first_menu, c.find("First Menu"));
        fill(&mut s.first_file_area, c.find("First File Area"));
        fill(&mut s.first_message_area, c.find("First Message Area"));
        fill(&mut s.kill_private, c.find("Kill Private"));

        if let Some(v) = c.find("Kill Attach") {
            s.kill_attach = v.to_string();
            if let Some(level) = super::kw_value(v, "Ask").filter(|l| !l.is_empty()) {
                s.kill_attach_priv = self.levels.priv_level(level);
            }
        }

        if !s.charset.is_empty() {
            match parse_charset(&s.charset) {
                Ok((_, high_bit)) => s.global_high_bit |= high_bit,
                Err(_) => warn!("max.ctl: unknown charset '{}'", escape_log(&s.charset)),
            }
        }

        fill_int(&mut s.date_style, c.int("Date Style"));
        fill_int(&mut s.filelist_margin, c.int("Filelist Margin"));
        fill_int(&mut s.exit_after_call, c.int("After Call Exit"));
        fill_int(&mut s.logon_priv, self.priv_of("Logon Level"));
        fill_int(&mut s.logon_timelimit, c.int("Logon TimeLimit"));
        fill_int(&mut s.min_logon_baud, c.int("Min Logon Baud"));
        fill_int(&mut s.min_graphics_baud, c.int("Min NonTTY Baud"));
        fill_int(&mut s.min_rip_baud, c.int("Min RIP Baud"));
        fill_int(&mut s.input_timeout, c.int("Input Timeout"));
        fill_int(&mut s.mailchecker_reply_priv, c.int("Mailchecker Reply Priv"));
        fill_int(&mut s.mailchecker_kill_priv, c.int("Mailchecker Kill Priv"));
        fill_int(&mut s.msg_localattach_priv, self.priv_of("Message Edit Ask LocalAttach"));
        fill_int(&mut s.kill_attach_priv, c.int("Kill Attach Priv"));

        // later spellings override earlier ones
        for kw in ["Upload Space Free", "Min Free KB"] {
            if let Some(v) = c.int(kw) {
                s.min_free_kb = v.max(0) as u32;
            }
        }
        for kw in ["MaxMsgSize", "Max MsgSize", "Message Size"] {
            if let Some(v) = c.int(kw) {
                s.max_msgsize = v.max(0) as u32;
            }
        }
        s
    }

    pub fn display_files(&self) -> DisplayFiles {
        let mut files = DisplayFiles::default();
        for (key, kw) in DisplayFiles::KEYWORDS {
            if let (Some(field), Some(v)) = (files.field_mut(key), self.ctl.find(kw)) {
                *field = v.to_string();
            }
        }
        files
    }

    pub fn matrix(&self) -> Matrix {
        let c = &self.ctl;
        let mut m = Matrix::default();

        fill_int(&mut m.ctla_priv, self.priv_of("Message Show Ctl_A to"));
        fill_int(&mut m.seenby_priv, self.priv_of("Message Show Seenby to"));
        fill_int(&mut m.private_priv, self.priv_of("Message Show Private to"));
        fill_int(&mut m.fromfile_priv, self.priv_of("Message Edit Ask FromFile"));

        if let Some(v) = c.find("Message Send Unlisted") {
            let (level, rest) = split_word(v);
            if !level.is_empty() {
                m.unlisted_priv = self.levels.priv_level(level);
            }
            m.unlisted_cost = leading_int(split_word(rest).0).unwrap_or(0);
        }

        m.log_echomail = c.has("Log EchoMail");

        for (kw, dst) in [
            ("After Edit", &mut m.after_edit_exit),
            ("After EchoMail", &mut m.after_echomail_exit),
            ("After Local", &mut m.after_local_exit),
        ] {
            // "After Edit Exit 12"
            if let Some(v) = c.find(kw) {
                fill_int(dst, leading_int(split_word(v).1));
            }
        }

        if let Some(v) = c.find("Nodelist") {
            let lower = v.to_ascii_lowercase();
            m.nodelist_version = if lower.contains("fd") || lower.contains("frontdoor") {
                "fd"
            } else if v.contains('5') {
                "5"
            } else if v.contains('6') {
                "6"
            } else if v.contains('7') {
                "7"
            } else {
                ""
            }
            .to_string();
        }
        fill(&mut m.fidouser, c.find("FidoUser"));
        fill(&mut m.echotoss_name, c.find("EchoToss Name"));

        for v in c.find_all("Address") {
            match NetAddress::parse(v) {
                Some(a) => m.addresses.push(a),
                None => debug!("max.ctl: skipping address '{}'", escape_log(v)),
            }
        }

        m.message_edit_ask = self.attribute_privs("Message Edit Ask");
        m.message_edit_assume = self.attribute_privs("Message Edit Assume");
        m
    }

    fn attribute_privs(&self, kw: &str) -> Vec<AttributePriv> {
        self.ctl
            .find_all(kw)
            .filter_map(|v| {
                let (attr, rest) = split_word(v);
                let (level, _) = split_word(rest);
                let attr = attr.to_ascii_lowercase();
                if level.is_empty() || !EDIT_ATTRIBUTES.contains(&attr.as_str()) {
                    return None;
                }
                Some(AttributePriv {
                    attribute: attr,
                    priv_level: self.levels.priv_level(level),
                })
            })
            .collect()
    }

    pub fn equipment(&self) -> Equipment {
        let c = &self.ctl;
        let mut e = Equipment::default();

        if let Some(v) = c.find("Output") {
            let lower = v.to_ascii_lowercase();
            if lower.starts_with("local") {
                e.output = "local".to_string();
            } else {
                e.output = "com".to_string();
                if let Some(port) = lower.strip_prefix("com").and_then(leading_int) {
                    if port > 0 {
                        e.com_port = port;
                    }
                }
            }
        }
        if let Some(port) = c.int("COM Port").filter(|&p| p > 0) {
            e.com_port = port;
        }
        fill_int(&mut e.baud_maximum, c.int("Baud Maximum"));

        fill(&mut e.busy, c.find_any(&["Busy", "Modem Busy"]));
        fill(&mut e.init, c.find_any(&["Init", "Modem Init"]));
        fill(&mut e.ring, c.find_any(&["Ring", "Modem Ring"]));
        fill(&mut e.answer, c.find_any(&["Answer", "Modem Answer"]));
        fill(&mut e.connect, c.find_any(&["Connect", "Modem Connect"]));
        fill_int(
            &mut e.carrier_mask,
            c.find_any(&["Mask Carrier", "Carrier Mask"]).map(atoi),
        );

        let tokens = c
            .find_all("Mask Handshaking")
            .flat_map(|v| v.split_whitespace())
            .chain(c.find_all("Handshaking").flat_map(|v| v.split(',')));
        for token in tokens {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match parse_handshaking_token(token) {
                Ok(_) => {
                    let name = token.to_ascii_lowercase();
                    if !e.handshaking.contains(&name) {
                        e.handshaking.push(name);
                    }
                }
                Err(_) => debug!("max.ctl: ignoring handshaking '{}'", escape_log(token)),
            }
        }

        e.send_break = c
            .flag("Send Break to Clear Buffer")
            .or_else(|| c.flag("Send Break"))
            .unwrap_or(false);
        e.no_critical = c.has("No Critical Handler") || c.has("No Critical");
        if e.com_port == 0 {
            e.com_port = 1;
        }
        e
    }

    /// Reader settings from `reader` when that file exists, otherwise from
    /// max.ctl itself.
    pub fn reader(&self, reader: &CtlFile) -> Reader {
        let c = if reader.exists() { reader } else { &self.ctl };
        let mut r = Reader::default();
        fill_int(&mut r.max_pack, c.find_any(&["Max Pack", "Max Messages"]).map(atoi));
        fill(&mut r.archivers_ctl, c.find_any(&["Archivers CTL", "Archivers"]));
        fill(&mut r.packet_name, c.find("Packet Name"));
        fill(&mut r.work_directory, c.find("Work Directory"));
        fill(&mut r.phone, c.find_any(&["Phone Number", "Phone"]));
        r
    }

    /// `External Protocol Errorlevel`, 0 when absent.
    pub fn protoexit(&self) -> i32 {
        self.ctl.int("External Protocol Errorlevel").unwrap_or(0)
    }
}
