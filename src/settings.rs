//! Settings for the `maxcfg` tool itself.
//!
//! These are read with the `toml` crate from an optional `maxcfg.toml`; the
//! configuration documents the tool edits go through [`crate::value`].
//!
//! ```toml
//! sys_path = "/opt/maximus"
//! config_dir = "/opt/maximus/config"
//! log_file = "/var/log/maxcfg.log"
//! default_lang = "config/lang/english.toml"
//! rip = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the Maximus installation (`etc/`, `protocol.max`, ...).
    #[serde(default = "default_sys_path")]
    pub sys_path: PathBuf,
    /// Export target; `<sys_path>/config` when unset.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Language file used by `lang` when none is given, relative to
    /// `sys_path` unless absolute.
    #[serde(default = "default_lang")]
    pub default_lang: String,
    #[serde(default)]
    pub rip: bool,
}

fn default_sys_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_lang() -> String {
    "config/lang/english.toml".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sys_path: default_sys_path(),
            config_dir: None,
            log_file: None,
            default_lang: default_lang(),
            rip: false,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read settings file {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse settings file {}: {}", path.display(), e))
    }

    /// Loads `path` when given; a missing default file is not an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let p = Path::new("maxcfg.toml");
                if p.is_file() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.config_dir
            .clone()
            .unwrap_or_else(|| self.sys_path.join("config"))
    }

    pub fn default_lang_path(&self) -> PathBuf {
        let p = Path::new(&self.default_lang);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.sys_path.join(p)
        }
    }
}
