mod common;

use std::fs;

use maxcfg::document::Document;
use maxcfg::error::Status;
use maxcfg::value::{emit_table, parse_str};

const SAMPLE: &str = "\
config_version = 1
system_name = \"ACME\"
[[area]]
name = \"MUF\"
style = [\"Squish\",\"Local\",\"Pub\"]
";

#[test]
fn test_parse_emit_reparse() {
    let table = parse_str(SAMPLE, "sample").unwrap();
    let mut doc = Document::new();
    doc.mount(table.clone(), "").unwrap();
    assert_eq!(doc.get("area[0].name").unwrap().as_str(), Some("MUF"));
    assert_eq!(doc.get("area[0].style[1]").unwrap().as_str(), Some("Local"));

    let emitted = emit_table(&table);
    let again = parse_str(&emitted, "emitted").unwrap();
    assert_eq!(again, table);
    // canonical output is a fixed point
    assert_eq!(emit_table(&again), emitted);
}

#[test]
fn test_override_isolation_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "maximus.toml", SAMPLE);
    let mut doc = Document::new();
    doc.load_file(&path, "maximus").unwrap();

    doc.set_string("maximus.system_name", "Night \"Owl\"\\BBS").unwrap();
    doc.set_int("maximus.task_num", 4).unwrap();
    assert_eq!(
        doc.get("maximus.system_name").unwrap().as_str(),
        Some("Night \"Owl\"\\BBS")
    );
    assert_eq!(doc.get_base("maximus.system_name").unwrap().as_str(), Some("ACME"));

    doc.clear_all();
    assert_eq!(doc.get("maximus.system_name").unwrap().as_str(), Some("ACME"));
    assert_eq!(
        doc.get("maximus.task_num").unwrap_err().status(),
        Status::NotFound
    );

    doc.set_string("maximus.system_name", "Night \"Owl\"\\BBS").unwrap();
    doc.persist_and_save("maximus.system_name").unwrap();
    assert_eq!(doc.persist_one("maximus.system_name").unwrap_err().status(), Status::NotFound);

    let mut reloaded = Document::new();
    reloaded.load_file(&path, "maximus").unwrap();
    assert_eq!(
        reloaded.get("maximus.system_name").unwrap().as_str(),
        Some("Night \"Owl\"\\BBS")
    );
    assert_eq!(reloaded.get("maximus.area[0].name").unwrap().as_str(), Some("MUF"));
    assert!(!dir.path().join("maximus.toml.tmp").exists());
}

#[test]
fn test_save_routes_to_owning_file() {
    let dir = tempfile::tempdir().unwrap();
    let sys = common::write(dir.path(), "maximus.toml", "system_name = \"ACME\"\n");
    let session = common::write(dir.path(), "general/session.toml", "date_style = 0\n");
    let mut doc = Document::new();
    doc.load_file(&sys, "maximus").unwrap();
    doc.load_file(&session, "general.session").unwrap();

    doc.set_int("general.session.date_style", 2).unwrap();
    doc.persist_and_save("general.session.date_style").unwrap();
    assert_eq!(fs::read_to_string(&session).unwrap(), "date_style = 2\n");
    assert_eq!(fs::read_to_string(&sys).unwrap(), "system_name = \"ACME\"\n");
}

#[test]
fn test_toml_suffix_fallback() {
    let dir = tempfile::tempdir().unwrap();
    common::write(dir.path(), "matrix.toml", "netmail_priv = 5\n");
    let mut doc = Document::new();
    doc.load_file(dir.path().join("matrix"), "matrix").unwrap();
    assert_eq!(doc.loaded_files()[0].path, dir.path().join("matrix.toml"));
    assert_eq!(doc.get("matrix.netmail_priv").unwrap().as_int(), Some(5));

    let err = doc.load_file(dir.path().join("absent"), "x").unwrap_err();
    assert_eq!(err.status(), Status::NotFound);
}

#[test]
fn test_parse_errors_carry_location() {
    let err = parse_str("a = 1\nb = [1, \"x\"]\n", "mixed.toml").unwrap_err();
    assert_eq!(err.status(), Status::Io);
    assert!(err.to_string().contains("mixed.toml"), "{}", err);
}
