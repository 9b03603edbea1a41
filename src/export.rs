//! # Transactional export
//!
//! Converts a legacy install (`<sys>/etc/*.ctl`, `protocol.max`,
//! `etc/lang/colors.lh`) into the TOML configuration tree under
//! `config_dir`. Every file of one export is committed through a shared
//! transaction so a failure part-way leaves the previous tree in place.
//!
//! ## Per-file protocol
//!
//! 1. An existing regular file at the target is moved into
//!    `<config>/.txn-<pid>-<epoch>/` as `<normalized rel path>.<seq>.bak`.
//! 2. New content goes to `<target>.new`, which is then renamed over the
//!    target.
//!
//! On the first failure every op is undone in reverse order: committed
//! files are removed and their backups moved back; backups of ops that
//! never committed are moved back too. The transaction directory is only
//! removed after a fully successful run.
//!
//! ## Order
//!
//! Menus, message areas, file areas, `general/*`, `matrix.toml`,
//! `security/access_levels.toml`, and `maximus.toml` last so its presence
//! marks a completed export.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use chrono::Utc;
use log::{debug, info, warn};
use thiserror::Error;

use crate::document::Document;
use crate::error::ConfigError;
use crate::fsutil;
use crate::legacy::{self, CtlFile, MaxCtl};
use crate::schema::{FileAreas, Menu, MsgAreas};

bitflags! {
    /// Which parts of the configuration an export writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExportFlags: u32 {
        const MENUS = 0x01;
        const MSG_AREAS = 0x02;
        const FILE_AREAS = 0x04;
        /// `general/*`, matrix, security and `maximus.toml`.
        const SYSTEM = 0x08;
    }
}

impl ExportFlags {
    /// Parses a `menus,msg,file,system` selection.
    pub fn parse_list(s: &str) -> Option<Self> {
        let mut out = Self::empty();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            out |= match part.to_ascii_lowercase().as_str() {
                "menus" | "menu" => Self::MENUS,
                "msg" | "msg_areas" => Self::MSG_AREAS,
                "file" | "file_areas" => Self::FILE_AREAS,
                "system" | "sys" => Self::SYSTEM,
                "all" => Self::all(),
                _ => return None,
            };
        }
        Some(out)
    }
}

/// One-line export diagnostic plus whatever caused it.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0}")]
    Invalid(String),

    #[error("{msg}")]
    Io {
        msg: String,
        #[source]
        source: io::Error,
    },

    #[error("{msg}: {source}")]
    Config {
        msg: String,
        #[source]
        source: ConfigError,
    },
}

impl ExportError {
    fn io(msg: String, source: io::Error) -> Self {
        ExportError::Io { msg, source }
    }

    fn config(msg: impl Into<String>, source: ConfigError) -> Self {
        ExportError::Config {
            msg: msg.into(),
            source,
        }
    }
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Lowercases and replaces anything outside `[a-z0-9._-]` with `_`.
pub fn normalize_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Debug)]
struct ExportOp {
    final_path: PathBuf,
    backup_path: Option<PathBuf>,
    committed: bool,
}

struct Transaction {
    config_dir: PathBuf,
    txn_dir: PathBuf,
    ops: Vec<ExportOp>,
}

impl Transaction {
    fn begin(config_dir: &Path) -> ExportResult<Self> {
        fs::create_dir_all(config_dir).map_err(|e| {
            ExportError::io(format!("Failed to create {}", config_dir.display()), e)
        })?;
        let txn_dir = config_dir.join(format!(
            ".txn-{}-{}",
            std::process::id(),
            Utc::now().timestamp()
        ));
        fs::create_dir_all(&txn_dir)
            .map_err(|e| ExportError::io(format!("Failed to create {}", txn_dir.display()), e))?;
        debug!("transaction directory {}", txn_dir.display());
        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            txn_dir,
            ops: Vec::new(),
        })
    }

    /// Renders the content for `rel`, then backs up the current file and
    /// commits the new one. Rendering comes first since the source may be
    /// the very file being replaced.
    fn write<F>(&mut self, rel: &str, render: F) -> ExportResult<()>
    where
        F: FnOnce() -> ExportResult<String>,
    {
        let content = render()?;
        let final_path = self.config_dir.join(rel);
        let seq = self.ops.len();

        let backup_path = if final_path.is_file() {
            let backup = self
                .txn_dir
                .join(format!("{}.{}.bak", normalize_component(rel), seq));
            fs::rename(&final_path, &backup).map_err(|e| {
                ExportError::io(
                    format!("Failed to backup {} ({})", final_path.display(), e),
                    e,
                )
            })?;
            debug!("op {}: backed up {} to {}", seq, rel, backup.display());
            Some(backup)
        } else {
            None
        };
        self.ops.push(ExportOp {
            final_path: final_path.clone(),
            backup_path,
            committed: false,
        });

        let new_path = fsutil::with_suffix(&final_path, ".new");
        if let Err(e) = fsutil::write_synced(&new_path, &content) {
            let _ = fs::remove_file(&new_path);
            return Err(ExportError::io(
                format!("Failed to open {} ({})", new_path.display(), e),
                e,
            ));
        }
        if let Err(e) = fs::rename(&new_path, &final_path) {
            let _ = fs::remove_file(&new_path);
            return Err(ExportError::io(
                format!("Failed to commit {} ({})", final_path.display(), e),
                e,
            ));
        }
        if let Some(op) = self.ops.last_mut() {
            op.committed = true;
        }
        debug!("op {}: committed {} ({} bytes)", seq, rel, content.len());
        Ok(())
    }

    fn rollback(&mut self) {
        for op in self.ops.iter().rev() {
            if op.committed {
                if let Err(e) = fs::remove_file(&op.final_path) {
                    warn!("rollback: removing {}: {}", op.final_path.display(), e);
                }
            }
            if let Some(backup) = &op.backup_path {
                if let Err(e) = fs::rename(backup, &op.final_path) {
                    warn!("rollback: restoring {}: {}", op.final_path.display(), e);
                }
            }
        }
        warn!("export rolled back {} files", self.ops.len());
    }

    fn cleanup(self) {
        for backup in self.ops.iter().filter_map(|op| op.backup_path.as_ref()) {
            let _ = fs::remove_file(backup);
        }
        if let Err(e) = fs::remove_dir(&self.txn_dir) {
            warn!("could not remove {}: {}", self.txn_dir.display(), e);
        }
    }
}

fn render_err(what: &str) -> impl FnOnce(ConfigError) -> ExportError + '_ {
    move |e| ExportError::config(format!("Failed to export {}", what), e)
}

/// Menus from `<sys>/config/menus/*.toml` when any load, otherwise from
/// `menus.ctl`.
fn load_menus(sys_dir: &Path) -> ExportResult<Vec<Menu>> {
    match load_toml_menus(&sys_dir.join("config").join("menus")) {
        Ok(menus) if !menus.is_empty() => return Ok(menus),
        Ok(_) => {}
        Err(e) => warn!("ignoring TOML menus: {}", e),
    }
    legacy::parse_menus_ctl(sys_dir).map_err(render_err("menus"))
}

fn load_toml_menus(dir: &Path) -> crate::error::Result<Vec<Menu>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
        })
        .collect();
    files.sort();

    let mut doc = Document::new();
    let mut menus = Vec::with_capacity(files.len());
    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let prefix = format!("menus.{}", stem);
        doc.load_file(&path, &prefix)?;
        menus.push(Menu::from_document(&doc, &prefix)?);
    }
    Ok(menus)
}

/// Prefers `<sys>/config/areas/<kind>/areas.toml` when it exists and loads.
fn areas_toml(sys_dir: &Path, kind: &str) -> Option<(Document, String)> {
    let path = sys_dir
        .join("config")
        .join("areas")
        .join(kind)
        .join("areas.toml");
    if !path.is_file() {
        return None;
    }
    let prefix = format!("areas.{}", kind);
    let mut doc = Document::new();
    match doc.load_file(&path, &prefix) {
        Ok(()) => Some((doc, prefix)),
        Err(e) => {
            warn!("{}: {}, falling back to CTL", path.display(), e);
            None
        }
    }
}

fn msg_areas_toml(sys_dir: &Path) -> ExportResult<String> {
    let areas = match areas_toml(sys_dir, "msg") {
        Some((doc, prefix)) => MsgAreas::from_document(&doc, &prefix),
        None => legacy::parse_msg_areas(sys_dir).map(|tree| MsgAreas::from(&tree)),
    };
    Ok(areas.map_err(render_err("message areas"))?.to_toml())
}

fn file_areas_toml(sys_dir: &Path) -> ExportResult<String> {
    let areas = match areas_toml(sys_dir, "file") {
        Some((doc, prefix)) => FileAreas::from_document(&doc, &prefix),
        None => legacy::parse_file_areas(sys_dir).map(|tree| FileAreas::from(&tree)),
    };
    Ok(areas.map_err(render_err("file areas"))?.to_toml())
}

/// An export run. [`export`] and [`export_from_maxctl`] cover the usual
/// calls.
pub struct Exporter {
    sys_dir: PathBuf,
    config_dir: PathBuf,
    flags: ExportFlags,
}

impl Exporter {
    pub fn new(sys_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            sys_dir: sys_dir.into(),
            config_dir: config_dir.into(),
            flags: ExportFlags::all(),
        }
    }

    pub fn flags(mut self, flags: ExportFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn run(&self) -> ExportResult<()> {
        if self.sys_dir.as_os_str().is_empty() || self.config_dir.as_os_str().is_empty() {
            return Err(ExportError::Invalid("Invalid sys_path or config_dir".into()));
        }
        info!(
            "exporting {} to {} ({:?})",
            self.sys_dir.display(),
            self.config_dir.display(),
            self.flags
        );

        let mut txn = Transaction::begin(&self.config_dir)?;
        match self.write_all(&mut txn) {
            Ok(()) => {
                info!("export committed {} files", txn.ops.len());
                txn.cleanup();
                Ok(())
            }
            Err(e) => {
                warn!("export failed: {}", e);
                txn.rollback();
                Err(e)
            }
        }
    }

    fn write_all(&self, txn: &mut Transaction) -> ExportResult<()> {
        let sys = self.sys_dir.as_path();

        if self.flags.contains(ExportFlags::MENUS) {
            for menu in load_menus(sys)? {
                if menu.name.is_empty() {
                    continue;
                }
                let rel = format!("menus/{}.toml", normalize_component(&menu.name));
                txn.write(&rel, || Ok(menu.to_toml()))?;
            }
        }
        if self.flags.contains(ExportFlags::MSG_AREAS) {
            txn.write("areas/msg/areas.toml", || msg_areas_toml(sys))?;
        }
        if self.flags.contains(ExportFlags::FILE_AREAS) {
            txn.write("areas/file/areas.toml", || file_areas_toml(sys))?;
        }
        if self.flags.contains(ExportFlags::SYSTEM) {
            self.write_system(txn)?;
        }
        Ok(())
    }

    fn write_system(&self, txn: &mut Transaction) -> ExportResult<()> {
        let sys = self.sys_dir.as_path();
        let maxctl = MaxCtl::load(sys).map_err(render_err("max.ctl"))?;

        txn.write("general/session.toml", || Ok(maxctl.session().to_toml()))?;
        txn.write("general/display_files.toml", || {
            Ok(maxctl.display_files().to_toml())
        })?;
        txn.write("general/colors.toml", || {
            Ok(legacy::parse_colors_lh(sys)
                .map_err(render_err("colors"))?
                .to_toml())
        })?;
        txn.write("general/reader.toml", || {
            let reader = CtlFile::load(&sys.join("etc").join("reader.ctl"))
                .map_err(render_err("reader"))?;
            Ok(maxctl.reader(&reader).to_toml())
        })?;
        txn.write("general/equipment.toml", || Ok(maxctl.equipment().to_toml()))?;
        txn.write("general/protocol.toml", || {
            Ok(legacy::parse_protocols(sys, maxctl.protoexit())
                .map_err(render_err("protocols"))?
                .to_toml())
        })?;
        txn.write("general/language.toml", || {
            Ok(legacy::parse_language_ctl(sys)
                .map_err(render_err("language"))?
                .to_toml())
        })?;
        txn.write("matrix.toml", || Ok(maxctl.matrix().to_toml()))?;
        txn.write("security/access_levels.toml", || {
            Ok(maxctl.levels().to_toml())
        })?;
        txn.write("maximus.toml", || {
            if !maxctl.exists() {
                return Err(ExportError::Invalid(format!(
                    "No max.ctl under {}",
                    sys.join("etc").display()
                )));
            }
            let system = maxctl.system(
                &sys.display().to_string(),
                &self.config_dir.display().to_string(),
            );
            Ok(system.to_toml())
        })
    }
}

/// Exports the parts selected by `flags` from `sys_dir` into `config_dir`.
pub fn export(sys_dir: &Path, config_dir: &Path, flags: ExportFlags) -> ExportResult<()> {
    Exporter::new(sys_dir, config_dir).flags(flags).run()
}

/// Like [`export`], with the system directory taken as the grandparent of
/// `max.ctl` (`<sys>/etc/max.ctl`).
pub fn export_from_maxctl(
    maxctl_path: &Path,
    config_dir: &Path,
    flags: ExportFlags,
) -> ExportResult<()> {
    if maxctl_path.as_os_str().is_empty() {
        return Err(ExportError::Invalid("Invalid max.ctl path".into()));
    }
    let sys_dir = sys_dir_of_maxctl(maxctl_path).ok_or_else(|| {
        ExportError::Invalid(format!(
            "Failed to derive sys_path from {}",
            maxctl_path.display()
        ))
    })?;
    export(&sys_dir, config_dir, flags)
}

/// `<sys>` for `<sys>/etc/max.ctl`; `.` when the path has no grandparent.
pub fn sys_dir_of_maxctl(maxctl_path: &Path) -> Option<PathBuf> {
    let etc = maxctl_path.parent()?;
    match etc.parent() {
        Some(sys) if !sys.as_os_str().is_empty() => Some(sys.to_path_buf()),
        _ => Some(PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_component() {
        assert_eq!(normalize_component("Menus/MAIN Menu.toml"), "menus_main_menu.toml");
        assert_eq!(normalize_component("a-b_c.9"), "a-b_c.9");
        assert_eq!(normalize_component("é"), "_");
    }

    #[test]
    fn test_flag_list() {
        assert_eq!(
            ExportFlags::parse_list("menus, system"),
            Some(ExportFlags::MENUS | ExportFlags::SYSTEM)
        );
        assert_eq!(ExportFlags::parse_list("all"), Some(ExportFlags::all()));
        assert_eq!(ExportFlags::parse_list("bogus"), None);
    }

    #[test]
    fn test_sys_dir_of_maxctl() {
        assert_eq!(
            sys_dir_of_maxctl(Path::new("/bbs/etc/max.ctl")),
            Some(PathBuf::from("/bbs"))
        );
        assert_eq!(
            sys_dir_of_maxctl(Path::new("etc/max.ctl")),
            Some(PathBuf::from("."))
        );
    }

    #[test]
    fn test_transaction_backup_and_rollback() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path();
        fs::write(cfg.join("maximus.toml"), "old = 1\n").unwrap();

        let mut txn = Transaction::begin(cfg).unwrap();
        txn.write("maximus.toml", || Ok("new = 2\n".into())).unwrap();
        txn.write("general/session.toml", || Ok("x = 1\n".into())).unwrap();
        let backup = txn.ops[0].backup_path.clone().unwrap();
        assert_eq!(backup.file_name().unwrap(), "maximus.toml.0.bak");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old = 1\n");

        let err = txn
            .write("matrix.toml", || Err(ExportError::Invalid("boom".into())))
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");

        txn.rollback();
        assert_eq!(fs::read_to_string(cfg.join("maximus.toml")).unwrap(), "old = 1\n");
        assert!(!cfg.join("general/session.toml").exists());
        assert!(!cfg.join("matrix.toml").exists());
        assert!(!cfg.join("matrix.toml.new").exists());
    }

    #[test]
    fn test_cleanup_removes_txn_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("matrix.toml"), "a = 1\n").unwrap();
        let mut txn = Transaction::begin(dir.path()).unwrap();
        let txn_dir = txn.txn_dir.clone();
        txn.write("matrix.toml", || Ok("a = 2\n".into())).unwrap();
        txn.cleanup();
        assert!(!txn_dir.exists());
        assert_eq!(fs::read_to_string(dir.path().join("matrix.toml")).unwrap(), "a = 2\n");
    }

    #[test]
    fn test_empty_paths_rejected() {
        let err = export(Path::new(""), Path::new("cfg"), ExportFlags::all()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid sys_path or config_dir");
    }
}
