use std::fmt;
use std::io;

use thiserror::Error;

/// Flat status classification shared by every operation in the crate.
///
/// Library calls return [`ConfigError`]; callers that need the historical
/// one-word classification (status lines, exit codes) ask the error for its
/// [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    InvalidArgument,
    OutOfMemory,
    NotFound,
    NotDir,
    Io,
    PathTooLong,
    Duplicate,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::InvalidArgument => "Invalid argument",
            Status::OutOfMemory => "Out of memory",
            Status::NotFound => "Not found",
            Status::NotDir => "Not a directory",
            Status::Io => "I/O error",
            Status::PathTooLong => "Path too long",
            Status::Duplicate => "Duplicate",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the configuration library.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Bad input, wrong value type, or a path that does not fit the grammar.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failure surfaced by a fallible reservation.
    #[error("out of memory")]
    OutOfMemory,

    /// Missing document path, file, or catalog entry.
    #[error("not found: {0}")]
    NotFound(String),

    /// A base directory exists but is not a directory.
    #[error("not a directory: {0}")]
    NotDir(String),

    /// Wrapper around IO errors (open, rename, fsync).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Malformed TOML or CTL input.
    #[error("parse error in {path} line {line}: {msg}")]
    Parse {
        path: String,
        line: usize,
        msg: String,
    },

    /// Joined path exceeds the platform limit.
    #[error("path too long: {0}")]
    PathTooLong(String),

    /// A name collides with an existing entry (language heaps).
    #[error("duplicate: {0}")]
    Duplicate(String),
}

impl ConfigError {
    pub fn status(&self) -> Status {
        match self {
            ConfigError::InvalidArgument(_) => Status::InvalidArgument,
            ConfigError::OutOfMemory => Status::OutOfMemory,
            ConfigError::NotFound(_) => Status::NotFound,
            ConfigError::NotDir(_) => Status::NotDir,
            ConfigError::Io(_) | ConfigError::Parse { .. } => Status::Io,
            ConfigError::PathTooLong(_) => Status::PathTooLong,
            ConfigError::Duplicate(_) => Status::Duplicate,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        ConfigError::NotFound(what.into())
    }

    pub(crate) fn parse(path: impl Into<String>, line: usize, msg: impl Into<String>) -> Self {
        ConfigError::Parse {
            path: path.into(),
            line,
            msg: msg.into(),
        }
    }
}

impl From<std::collections::TryReserveError> for ConfigError {
    fn from(_: std::collections::TryReserveError) -> Self {
        ConfigError::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
