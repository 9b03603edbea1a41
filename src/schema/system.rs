//! `maximus.toml`: board identity, paths and global switches.

use crate::document::Document;
use crate::error::{ConfigError, Result};
use crate::value::ValueRef;

use super::enums::{log_mode_name, multitasker_name};
use super::{Fields, TomlWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct System {
    pub config_version: i32,
    pub system_name: String,
    pub sysop: String,
    pub task_num: i32,
    pub video: String,
    pub has_snow: bool,
    pub multitasker: String,

    pub sys_path: String,
    pub config_path: String,
    pub display_path: String,
    pub menu_path: String,
    pub rip_path: String,
    pub mex_path: String,
    pub lang_path: String,
    pub data_path: String,
    pub misc_path: String,
    pub file_password: String,
    pub file_callers: String,
    pub file_access: String,
    pub protocol_ctl: String,
    pub message_data: String,
    pub file_data: String,
    pub net_info_path: String,
    pub outbound_path: String,
    pub inbound_path: String,
    pub run_path: String,
    pub node_path: String,
    pub temp_path: String,
    pub stage_path: String,
    pub doors_path: String,
    pub ipc_path: String,

    pub log_file: String,
    pub log_mode: String,

    pub msg_reader_menu: String,
    pub mcp_pipe: String,
    pub mcp_sessions: i32,
    pub snoop: bool,
    pub no_password_encryption: bool,
    pub no_share: bool,
    pub reboot: bool,
    pub swap: bool,
    pub dos_close: bool,
    pub local_input_timeout: bool,
    pub status_line: bool,
}

impl Default for System {
    fn default() -> Self {
        Self {
            config_version: 1,
            system_name: String::new(),
            sysop: String::new(),
            task_num: 0,
            video: String::new(),
            has_snow: false,
            multitasker: String::new(),
            sys_path: String::new(),
            config_path: String::new(),
            display_path: String::new(),
            menu_path: String::new(),
            rip_path: String::new(),
            mex_path: String::new(),
            lang_path: String::new(),
            data_path: String::new(),
            misc_path: String::new(),
            file_password: String::new(),
            file_callers: String::new(),
            file_access: String::new(),
            protocol_ctl: String::new(),
            message_data: String::new(),
            file_data: String::new(),
            net_info_path: String::new(),
            outbound_path: String::new(),
            inbound_path: String::new(),
            run_path: String::new(),
            node_path: String::new(),
            temp_path: String::new(),
            stage_path: String::new(),
            doors_path: String::new(),
            ipc_path: String::new(),
            log_file: String::new(),
            log_mode: String::new(),
            msg_reader_menu: "MSGREAD".to_string(),
            mcp_pipe: String::new(),
            mcp_sessions: 0,
            snoop: false,
            no_password_encryption: false,
            no_share: false,
            reboot: false,
            swap: false,
            dos_close: false,
            local_input_timeout: false,
            status_line: false,
        }
    }
}

/// A field stored either by name or by numeric code; codes are mapped back
/// to their names where one exists.
fn name_or_code(f: &Fields<'_>, key: &str, name: fn(i32) -> Option<&'static str>) -> Result<String> {
    match f.raw(key)? {
        None => Ok(String::new()),
        Some(ValueRef::Str(s)) => Ok(s.to_string()),
        Some(v @ (ValueRef::Int(_) | ValueRef::Uint(_))) => {
            let code = v
                .as_int()
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(|| ConfigError::invalid(format!("{}: out of range", key)))?;
            Ok(name(code).map_or_else(|| code.to_string(), str::to_string))
        }
        Some(other) => Err(ConfigError::invalid(format!(
            "{}: expected string or integer, found {}",
            key,
            other.type_name()
        ))),
    }
}

impl System {
    pub fn from_document(doc: &Document, prefix: &str) -> Result<Self> {
        let f = Fields::of_document(doc, prefix)?;
        let d = Self::default();
        Ok(Self {
            config_version: f.int("config_version", d.config_version)?,
            system_name: f.str("system_name")?,
            sysop: f.str("sysop")?,
            task_num: f.int("task_num", 0)?,
            video: f.str("video")?,
            has_snow: f.bool("has_snow", false)?,
            multitasker: name_or_code(&f, "multitasker", multitasker_name)?,
            sys_path: f.str("sys_path")?,
            config_path: f.str("config_path")?,
            display_path: f.str("display_path")?,
            menu_path: f.str("menu_path")?,
            rip_path: f.str("rip_path")?,
            mex_path: f.str("mex_path")?,
            lang_path: f.str("lang_path")?,
            data_path: f.str("data_path")?,
            misc_path: f.str("misc_path")?,
            file_password: f.str("file_password")?,
            file_callers: f.str("file_callers")?,
            file_access: f.str("file_access")?,
            protocol_ctl: f.str("protocol_ctl")?,
            message_data: f.str("message_data")?,
            file_data: f.str("file_data")?,
            net_info_path: f.str("net_info_path")?,
            outbound_path: f.str("outbound_path")?,
            inbound_path: f.str("inbound_path")?,
            run_path: f.str("run_path")?,
            node_path: f.str("node_path")?,
            temp_path: f.str("temp_path")?,
            stage_path: f.str("stage_path")?,
            doors_path: f.str("doors_path")?,
            ipc_path: f.str("ipc_path")?,
            log_file: f.str("log_file")?,
            log_mode: name_or_code(&f, "log_mode", log_mode_name)?,
            msg_reader_menu: f.str_or("msg_reader_menu", &d.msg_reader_menu)?,
            mcp_pipe: f.str("mcp_pipe")?,
            mcp_sessions: f.int("mcp_sessions", 0)?,
            snoop: f.bool("snoop", false)?,
            no_password_encryption: f.bool("no_password_encryption", false)?,
            no_share: f.bool("no_share", false)?,
            reboot: f.bool("reboot", false)?,
            swap: f.bool("swap", false)?,
            dos_close: f.bool("dos_close", false)?,
            local_input_timeout: f.bool("local_input_timeout", false)?,
            status_line: f.bool("status_line", false)?,
        })
    }

    pub fn to_toml(&self) -> String {
        let mut w = TomlWriter::new();
        w.int("config_version", self.config_version.into())
            .str("system_name", &self.system_name)
            .str("sysop", &self.sysop)
            .int("task_num", self.task_num.into())
            .str("video", &self.video)
            .bool("has_snow", self.has_snow)
            .str("multitasker", &self.multitasker);

        w.banner("Core Paths")
            .comment("sys_path is the only absolute path; the others are relative to it")
            .str("sys_path", &self.sys_path)
            .str("config_path", &self.config_path);

        w.banner("Display")
            .str("display_path", &self.display_path)
            .str("menu_path", &self.menu_path)
            .str("rip_path", &self.rip_path);

        w.banner("Scripts").str("mex_path", &self.mex_path);

        w.banner("Language").str("lang_path", &self.lang_path);

        w.banner("Data")
            .str("data_path", &self.data_path)
            .str("misc_path", &self.misc_path)
            .str("file_password", &self.file_password)
            .str("file_callers", &self.file_callers)
            .str("file_access", &self.file_access)
            .str("protocol_ctl", &self.protocol_ctl)
            .str("message_data", &self.message_data)
            .str("file_data", &self.file_data)
            .str("net_info_path", &self.net_info_path)
            .str("outbound_path", &self.outbound_path)
            .str("inbound_path", &self.inbound_path);

        w.banner("Runtime")
            .str("run_path", &self.run_path)
            .str("node_path", &self.node_path)
            .str("temp_path", &self.temp_path)
            .str("stage_path", &self.stage_path)
            .str("doors_path", &self.doors_path)
            .str("ipc_path", &self.ipc_path);

        w.banner("Logging")
            .str("log_file", &self.log_file)
            .str("log_mode", &self.log_mode);

        w.banner("System Settings")
            .str("msg_reader_menu", &self.msg_reader_menu)
            .str("mcp_pipe", &self.mcp_pipe)
            .int("mcp_sessions", self.mcp_sessions.into())
            .bool("snoop", self.snoop)
            .bool("no_password_encryption", self.no_password_encryption)
            .bool("no_share", self.no_share)
            .bool("reboot", self.reboot)
            .bool("swap", self.swap)
            .bool("dos_close", self.dos_close)
            .bool("local_input_timeout", self.local_input_timeout)
            .bool("status_line", self.status_line);
        w.finish()
    }
}
