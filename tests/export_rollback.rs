mod common;

use std::fs;

use maxcfg::export::{export, ExportFlags};

const PRIOR_SYSTEM: &str = "system_name = \"Old Board\"\n";
const PRIOR_MAIN: &str = "# hand edited\nname = \"MAIN\"\n";

#[test]
fn test_failed_menu_commit_rolls_back() {
    let sys = common::writable_install();
    let out = sys.path().join("out");
    common::write(&out, "maximus.toml", PRIOR_SYSTEM);
    common::write(&out, "menus/main.toml", PRIOR_MAIN);
    // the fourth menu cannot be renamed into place
    common::write(&out, "menus/chat.toml/keep", "");

    let err = export(sys.path(), &out, ExportFlags::all()).unwrap_err();
    assert!(err.to_string().starts_with("Failed to commit"), "{}", err);

    assert_eq!(fs::read_to_string(out.join("maximus.toml")).unwrap(), PRIOR_SYSTEM);
    assert_eq!(fs::read_to_string(out.join("menus/main.toml")).unwrap(), PRIOR_MAIN);
    assert!(!out.join("menus/message.toml").exists());
    assert!(!out.join("menus/file.toml").exists());
    assert!(!out.join("areas").exists() || common::list_files(&out.join("areas")).is_empty());

    let outside_txn: Vec<String> = common::list_files(&out)
        .into_iter()
        .filter(|f| !f.starts_with(".txn-"))
        .collect();
    assert_eq!(outside_txn, ["maximus.toml", "menus/chat.toml/keep", "menus/main.toml"]);

    // the transaction directory stays behind for inspection
    let txn_dirs = fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".txn-"))
        .count();
    assert_eq!(txn_dirs, 1);
}

#[test]
fn test_export_succeeds_once_unblocked() {
    let sys = common::writable_install();
    let out = sys.path().join("out");
    common::write(&out, "menus/main.toml", PRIOR_MAIN);
    common::write(&out, "menus/chat.toml/keep", "");
    assert!(export(sys.path(), &out, ExportFlags::MENUS).is_err());

    fs::remove_dir_all(out.join("menus/chat.toml")).unwrap();
    export(sys.path(), &out, ExportFlags::MENUS).unwrap();
    let main = fs::read_to_string(out.join("menus/main.toml")).unwrap();
    assert!(main.contains("Main Menu (%t mins)"));
    assert!(out.join("menus/chat.toml").is_file());
}

#[test]
fn test_unwritable_config_dir() {
    let sys = common::writable_install();
    let blocker = common::write(sys.path(), "not_a_dir", "x");
    let err = export(sys.path(), &blocker.join("config"), ExportFlags::all()).unwrap_err();
    assert!(err.to_string().starts_with("Failed to create"), "{}", err);
}
