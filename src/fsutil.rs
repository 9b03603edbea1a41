//! File helpers shared by document saves and the exporter.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::debug;

use crate::error::{ConfigError, Result};

/// Reads a text file. Valid UTF-8 is taken as-is; anything else is decoded
/// byte-for-byte as Latin-1 so legacy code-page files still load.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::not_found(path.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    })
}

/// Like [`read_text`], but a missing file yields `None`.
pub fn read_text_opt(path: &Path) -> Result<Option<String>> {
    match read_text(path) {
        Ok(s) => Ok(Some(s)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// `path` with `suffix` appended to the file name (`a.toml` -> `a.toml.tmp`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Writes `content` to `<path>.tmp`, syncs it, and renames it over `path`.
/// Writers of the same target serialize on an exclusive lock of the
/// `<path>.lock` sidecar; the target is never opened before the rename, so a
/// failed write leaves it exactly as it was.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let lock_path = with_suffix(path, ".lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&lock_path)?;
    lock_file.lock_exclusive()?;

    let tmp_path = with_suffix(path, ".tmp");
    let written = (|| -> io::Result<()> {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = written {
        if tmp_path.is_file() {
            let _ = fs::remove_file(&tmp_path);
        }
        let _ = fs::remove_file(&lock_path);
        let _ = lock_file.unlock();
        return Err(e.into());
    }

    // Persist the rename itself (best-effort).
    if let Some(dir) = path.parent() {
        if let Ok(d) = File::open(if dir.as_os_str().is_empty() { Path::new(".") } else { dir }) {
            let _ = d.sync_all();
        }
    }
    let _ = fs::remove_file(&lock_path);
    let _ = lock_file.unlock();
    debug!("wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Creates `path` (and parents) with `content`, syncing before returning.
pub fn write_synced(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut f = File::create(path)?;
    f.write_all(content.as_bytes())?;
    f.flush()?;
    f.sync_all()
}
