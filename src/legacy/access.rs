//! `etc/access.ctl`: privilege classes.
//!
//! ```text
//! Access Normal
//!     Level     20
//!     Desc      Normal user
//!     Time      60
//!     UserFlags $0010
//! End Access
//! ```

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::schema::enums::atoi;
use crate::schema::{AccessLevel, AccessLevels};

use super::{kw_value, split_word, CtlFile};

fn new_level(name: &str) -> AccessLevel {
    AccessLevel {
        name: name.to_string(),
        calls: -1,
        logon_baud: 300,
        xfer_baud: 300,
        ..AccessLevel::default()
    }
}

/// `$`-prefixed values are hex, anything else decimal.
fn parse_user_flags(v: &str) -> u32 {
    let (digits, radix) = match v.strip_prefix('$') {
        Some(hex) => (hex, 16),
        None => (v, 10),
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    u32::from_str_radix(&digits[..end], radix).unwrap_or(0)
}

fn words(v: &str) -> impl Iterator<Item = String> + '_ {
    v.split_whitespace().map(str::to_string)
}

/// Parses every `Access` block of `path`. A new `Access` line implicitly
/// closes an open block; lines outside blocks are ignored. A missing file
/// yields no levels.
pub fn parse_access_ctl(path: &Path) -> Result<AccessLevels> {
    Ok(read_access(&CtlFile::load(path)?))
}

pub fn read_access(ctl: &CtlFile) -> AccessLevels {
    let mut levels = Vec::new();
    let mut cur: Option<AccessLevel> = None;

    for (_, line) in ctl.lines() {
        if let Some(name) = kw_value(line, "Access") {
            levels.extend(cur.take());
            cur = Some(new_level(name));
            continue;
        }
        if line.eq_ignore_ascii_case("End Access") {
            levels.extend(cur.take());
            continue;
        }
        let Some(l) = cur.as_mut() else {
            continue;
        };

        let (key, rest) = split_word(line);
        match key {
            "Level" => l.level = atoi(rest),
            "Desc" => l.description = rest.to_string(),
            "Alias" => l.alias = rest.to_string(),
            "Key" => l.key = rest.to_string(),
            "Time" => l.time = atoi(rest),
            "Cume" => l.cume = atoi(rest),
            "Calls" => l.calls = atoi(rest),
            "LogonBaud" => l.logon_baud = atoi(rest),
            "XferBaud" => l.xfer_baud = atoi(rest),
            "FileLimit" => l.file_limit = atoi(rest),
            "FileRatio" => l.file_ratio = atoi(rest),
            "RatioFree" => l.ratio_free = atoi(rest),
            "UploadReward" => l.upload_reward = atoi(rest),
            "LoginFile" => l.login_file = rest.to_string(),
            "Flags" => l.flags.extend(words(rest)),
            "MailFlags" => l.mail_flags.extend(words(rest)),
            "UserFlags" => l.user_flags = parse_user_flags(rest),
            "Oldpriv" => l.oldpriv = atoi(rest),
            _ => {}
        }
    }
    levels.extend(cur);
    debug!("{}: {} access levels", ctl.path().display(), levels.len());
    AccessLevels { levels }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
% classes
Access Normal
    Level 20
    Desc Normal user
    Flags Hangup NoLimits
    Flags ShowHidden
    UserFlags $1f
End Access

Level 999

Access Sysop
    Level 100
    Calls 10
    UserFlags 12
Access Hidden
    Level 65535
";

    #[test]
    fn test_blocks_and_defaults() {
        let levels = read_access(&CtlFile::from_text(Path::new("access.ctl"), SAMPLE)).levels;
        assert_eq!(levels.len(), 3);

        let normal = &levels[0];
        assert_eq!(normal.name, "Normal");
        assert_eq!(normal.level, 20);
        assert_eq!(normal.description, "Normal user");
        assert_eq!(normal.flags, ["Hangup", "NoLimits", "ShowHidden"]);
        assert_eq!(normal.user_flags, 0x1f);
        assert_eq!((normal.calls, normal.logon_baud, normal.xfer_baud), (-1, 300, 300));

        assert_eq!(levels[1].calls, 10);
        assert_eq!(levels[1].user_flags, 12);
        // implicitly closed by the next Access line, and at end of file
        assert_eq!(levels[2].name, "Hidden");
    }

    #[test]
    fn test_priv_lookup_through_levels() {
        let levels = read_access(&CtlFile::from_text(Path::new("access.ctl"), SAMPLE));
        assert_eq!(levels.priv_level("sysop"), 100);
        assert_eq!(levels.priv_level("42"), 42);
        assert_eq!(levels.priv_level("nobody"), 0);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let levels = parse_access_ctl(&dir.path().join("access.ctl")).unwrap();
        assert!(levels.levels.is_empty());
    }
}
