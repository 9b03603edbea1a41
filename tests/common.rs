//! Test utilities & fixtures.
//! Provides access to the legacy install under `tests/fixtures/legacy`.

#![allow(dead_code)] // each integration test uses a different subset

use std::fs;
use std::path::{Path, PathBuf};

use maxcfg::legacy::ProtocolRecord;

/// Return the path to the static legacy install fixture.
/// Tests that mutate it work on [`writable_install`] instead.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("legacy")
}

fn copy_tree(src: &Path, dst: &Path) {
    fs::create_dir_all(dst).unwrap();
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let to = dst.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &to);
        } else {
            fs::copy(entry.path(), &to).unwrap();
        }
    }
}

/// The two `protocol.max` slots of the fixture install: slot 0 backs the
/// Zmodem block of `protocol.ctl`, slot 1 has no text counterpart.
pub fn protocol_records() -> Vec<ProtocolRecord> {
    vec![
        ProtocolRecord {
            flag: 0x02,
            description: "Zmodem".into(),
            download_string: "Z-DL".into(),
            upload_keyword: "Received".into(),
            filename_word: 2,
            ..ProtocolRecord::default()
        },
        ProtocolRecord {
            flag: 0x04,
            description: "Kermit".into(),
            download_cmd: "kermit -s %s".into(),
            ..ProtocolRecord::default()
        },
    ]
}

/// A writable copy (temp dir) of the fixture install with a packed
/// `protocol.max` next to `etc/`.
pub fn writable_install() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    copy_tree(&fixture_root(), tmp.path());
    let image: Vec<u8> = protocol_records().iter().flat_map(|r| r.encode()).collect();
    fs::write(tmp.path().join("protocol.max"), image).unwrap();
    tmp
}

/// Writes `text` at `rel` below `root`, creating parent directories.
pub fn write(root: &Path, rel: &str, text: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

/// Every file below `dir`, relative to it, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                out.push(path.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/"));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}
