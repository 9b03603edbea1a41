//! Base-directory path resolution.
//!
//! Configuration values store paths relative to the system directory. These
//! helpers join them back onto a base without touching the filesystem
//! ([`resolve`]) or against a validated base directory handle ([`BaseDir`]).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Longest result accepted by [`resolve`], in bytes (`PATH_MAX` on Linux).
pub const MAX_PATH_LEN: usize = 4096;

/// True for `/x`, `\x`, and `C:...` forms.
pub fn is_absolute(path: &str) -> bool {
    let b = path.as_bytes();
    match b {
        [] => false,
        [b'/', ..] | [b'\\', ..] => true,
        [d, b':', ..] => d.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Join `base` with `rel`, inserting a `/` when `base` lacks a trailing
/// separator. Absolute `rel` is returned unchanged regardless of `base`.
pub fn resolve(base: &str, rel: &str) -> Result<String> {
    if is_absolute(rel) {
        if rel.len() >= MAX_PATH_LEN {
            return Err(ConfigError::PathTooLong(rel.to_string()));
        }
        return Ok(rel.to_string());
    }
    if base.is_empty() {
        return Err(ConfigError::invalid("empty base directory"));
    }

    let need_sep = !base.ends_with('/') && !base.ends_with('\\');
    let want = base.len() + usize::from(need_sep) + rel.len();
    if want >= MAX_PATH_LEN {
        return Err(ConfigError::PathTooLong(format!("{}/{}", base, rel)));
    }

    let mut out = String::with_capacity(want);
    out.push_str(base);
    if need_sep {
        out.push('/');
    }
    out.push_str(rel);
    Ok(out)
}

/// A base directory that was checked to exist and be a directory.
#[derive(Debug, Clone)]
pub struct BaseDir {
    dir: String,
}

impl BaseDir {
    pub fn open(dir: impl AsRef<str>) -> Result<Self> {
        let dir = dir.as_ref();
        if dir.is_empty() {
            return Err(ConfigError::invalid("empty base directory"));
        }
        match fs::metadata(dir) {
            Ok(md) if md.is_dir() => Ok(Self { dir: dir.to_string() }),
            Ok(_) => Err(ConfigError::NotDir(dir.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ConfigError::not_found(dir)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.dir
    }

    pub fn join(&self, rel: &str) -> Result<PathBuf> {
        resolve(&self.dir, rel).map(PathBuf::from)
    }
}

impl AsRef<Path> for BaseDir {
    fn as_ref(&self) -> &Path {
        Path::new(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_joins_with_separator() {
        assert_eq!(resolve("/etc/max", "msgarea.ctl").unwrap(), "/etc/max/msgarea.ctl");
        assert_eq!(resolve("/etc/max/", "sub/rel").unwrap(), "/etc/max/sub/rel");
    }

    #[test]
    fn test_absolute_wins() {
        assert_eq!(resolve("/etc/max", "/opt/a").unwrap(), "/opt/a");
        assert_eq!(resolve("", "/abs").unwrap(), "/abs");
        assert_eq!(resolve("/x", "C:\\max\\etc").unwrap(), "C:\\max\\etc");
    }

    #[test]
    fn test_empty_base_is_invalid() {
        let err = resolve("", "x").unwrap_err();
        assert_eq!(err.status(), crate::error::Status::InvalidArgument);
    }

    #[test]
    fn test_overlong_path_rejected() {
        let long = "a".repeat(MAX_PATH_LEN);
        let err = resolve("/base", &long).unwrap_err();
        assert_eq!(err.status(), crate::error::Status::PathTooLong);
    }

    #[test]
    fn test_base_dir_checks_kind() {
        let dir = tempfile::tempdir().unwrap();
        let base = BaseDir::open(dir.path().to_str().unwrap()).unwrap();
        assert!(base.join("etc/max.ctl").unwrap().ends_with("etc/max.ctl"));

        let file = dir.path().join("plain");
        std::fs::write(&file, "x").unwrap();
        let err = BaseDir::open(file.to_str().unwrap()).unwrap_err();
        assert_eq!(err.status(), crate::error::Status::NotDir);

        let err = BaseDir::open(dir.path().join("missing").to_str().unwrap()).unwrap_err();
        assert_eq!(err.status(), crate::error::Status::NotFound);
    }
}
