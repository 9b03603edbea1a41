mod common;

use std::fs;
use std::path::Path;

use maxcfg::area_tree::AreaTree;
use maxcfg::document::Document;
use maxcfg::export::{export, export_from_maxctl, ExportFlags};
use maxcfg::mci::Theme;
use maxcfg::schema::{
    AccessLevels, Color, Colors, Equipment, FileAreas, Language, Menu, MsgArea, MsgAreas,
    ProtocolList, Reader, Session, System,
};

fn load(config: &Path, rel: &str, prefix: &str) -> Document {
    let mut doc = Document::new();
    doc.load_file(config.join(rel), prefix).unwrap();
    doc
}

fn snapshot(dir: &Path) -> Vec<(String, String)> {
    common::list_files(dir)
        .into_iter()
        .map(|rel| {
            let text = fs::read_to_string(dir.join(&rel)).unwrap();
            (rel, text)
        })
        .collect()
}

#[test]
fn test_full_export_layout() {
    let sys = common::writable_install();
    let config = sys.path().join("config");
    export(sys.path(), &config, ExportFlags::all()).unwrap();

    assert_eq!(
        common::list_files(&config),
        [
            "areas/file/areas.toml",
            "areas/msg/areas.toml",
            "general/colors.toml",
            "general/display_files.toml",
            "general/equipment.toml",
            "general/language.toml",
            "general/protocol.toml",
            "general/reader.toml",
            "general/session.toml",
            "matrix.toml",
            "maximus.toml",
            "menus/chat.toml",
            "menus/file.toml",
            "menus/main.toml",
            "menus/message.toml",
            "security/access_levels.toml",
        ]
    );
    // no transaction directory survives a successful run
    let leftovers: Vec<_> = fs::read_dir(&config)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".txn-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_system_views_read_back() {
    let sys = common::writable_install();
    let config = sys.path().join("config");
    export(sys.path(), &config, ExportFlags::SYSTEM).unwrap();

    let doc = load(&config, "maximus.toml", "maximus");
    let system = System::from_document(&doc, "maximus").unwrap();
    assert_eq!(system.system_name, "Night Owl BBS");
    assert_eq!(system.sysop, "Jo Sysop");
    assert_eq!(system.log_mode, "Verbose");
    assert_eq!(system.file_callers, "etc/callers.bbs");
    assert!(system.snoop);
    assert_eq!(system.sys_path, sys.path().display().to_string());
    assert_eq!(doc.get("maximus.config_version").unwrap().as_int(), Some(1));

    let doc = load(&config, "general/session.toml", "general.session");
    let session = Session::from_document(&doc, "general.session").unwrap();
    assert_eq!(session.logon_priv, 20);
    assert_eq!(session.date_style, 1);
    assert!(session.alias_system);

    let doc = load(&config, "general/equipment.toml", "general.equipment");
    let eq = Equipment::from_document(&doc, "general.equipment").unwrap();
    assert_eq!((eq.output.as_str(), eq.com_port, eq.baud_maximum), ("com", 1, 38400));

    let doc = load(&config, "general/reader.toml", "general.reader");
    let reader = Reader::from_document(&doc, "general.reader").unwrap();
    assert_eq!(reader.max_pack, 500);
    assert_eq!(reader.packet_name, "NOWL");

    let doc = load(&config, "general/language.toml", "general.language");
    let lang = Language::from_document(&doc, "general.language").unwrap();
    assert_eq!(lang.max_lang, 2);
    assert_eq!(lang.lang_files, ["english", "deutsch"]);

    let doc = load(&config, "security/access_levels.toml", "security.access_levels");
    let levels = AccessLevels::from_document(&doc, "security.access_levels").unwrap();
    assert_eq!(levels.levels.len(), 3);
    let normal = levels.find("Normal").unwrap();
    assert_eq!((normal.level, normal.time, normal.user_flags), (20, 60, 0x10));
    assert_eq!(normal.calls, -1);
}

#[test]
fn test_colors_and_protocols_read_back() {
    let sys = common::writable_install();
    let config = sys.path().join("config");
    export(sys.path(), &config, ExportFlags::SYSTEM).unwrap();

    let doc = load(&config, "general/colors.toml", "general.colors");
    let colors = Colors::from_document(&doc, "general.colors").unwrap();
    assert_eq!(colors.menu_name, Color::new(14, 0, false));
    assert_eq!(colors.menu_highlight, Color::new(15, 1, true));
    assert_eq!(colors.msg_body, Colors::default().msg_body);
    assert_eq!(Theme::from_document(&doc, "general.colors").unwrap(), Theme::default());

    let doc = load(&config, "general/protocol.toml", "general.protocol");
    let list = ProtocolList::from_document(&doc, "general.protocol").unwrap();
    assert_eq!(list.protoexit, 9);
    assert!(list.protocol_max_exists);
    assert!(list.protocol_ctl_exists);
    assert_eq!(list.protocols.len(), 1);
    let z = list.find("zmodem").unwrap();
    assert!(z.batch);
    assert_eq!(z.log_file, "zm.log");
    assert_eq!(z.download_cmd, "sz -b %s");
    // empty text fields are filled from the binary slot
    assert_eq!(z.download_string, "Z-DL");
    assert_eq!(z.upload_keyword, "Received");
    assert_eq!(z.filename_word, 2);
}

#[test]
fn test_areas_and_menus_read_back() {
    let sys = common::writable_install();
    let config = sys.path().join("config");
    export(
        sys.path(),
        &config,
        ExportFlags::MENUS | ExportFlags::MSG_AREAS | ExportFlags::FILE_AREAS,
    )
    .unwrap();
    assert!(!config.join("maximus.toml").exists());

    let doc = load(&config, "areas/msg/areas.toml", "areas.msg");
    let msg = MsgAreas::from_document(&doc, "areas.msg").unwrap();
    let names: Vec<_> = msg.areas.iter().map(|a| (a.name.as_str(), a.division.as_str())).collect();
    assert_eq!(names, [("sysop", ""), ("rust", "prog")]);
    assert_eq!(msg.areas[0].style, ["Squish", "Local", "Pvt"]);
    assert_eq!(msg.areas[1].style, ["Squish", "Echo", "Pub"]);
    assert_eq!(msg.areas[1].renum_max, 500);

    let tree: AreaTree<MsgArea> = AreaTree::from(&msg);
    let rust = tree.find("prog.rust").unwrap();
    assert_eq!(tree.node(rust).area().unwrap().tag, "RUST");
    assert_eq!(tree.node(rust).division_level, 1);

    let doc = load(&config, "areas/file/areas.toml", "areas.file");
    let files = FileAreas::from_document(&doc, "areas.file").unwrap();
    assert_eq!(files.divisions[0].description, "Utilities");
    assert_eq!(files.areas[0].name, "dos");
    assert_eq!(files.areas[0].types, ["CD"]);
    assert_eq!(files.areas[1].division, "");

    let doc = load(&config, "menus/main.toml", "menus.main");
    let main = Menu::from_document(&doc, "menus.main").unwrap();
    assert_eq!(main.name, "MAIN");
    assert_eq!(main.title, "Main Menu (%t mins)");
    assert_eq!(main.menu_types, ["Novice"]);
    assert_eq!(main.options.len(), 3);
    assert_eq!(main.options[0].key_poke, "M");
    assert_eq!(main.options[2].command, "Goodbye");
}

#[test]
fn test_reexport_is_stable() {
    let sys = common::writable_install();
    let config = sys.path().join("config");
    export(sys.path(), &config, ExportFlags::all()).unwrap();
    let first = snapshot(&config);

    // areas and menus now come from the TOML written by the first run
    fs::remove_file(sys.path().join("etc/msgarea.ctl")).unwrap();
    fs::remove_file(sys.path().join("etc/menus.ctl")).unwrap();
    export(sys.path(), &config, ExportFlags::all()).unwrap();
    assert_eq!(snapshot(&config), first);
}

#[test]
fn test_export_from_maxctl_defaults() {
    let sys = common::writable_install();
    let out = sys.path().join("out");
    export_from_maxctl(&sys.path().join("etc/max.ctl"), &out, ExportFlags::SYSTEM).unwrap();
    let doc = load(&out, "maximus.toml", "");
    assert_eq!(doc.get("system_name").unwrap().as_str(), Some("Night Owl BBS"));
    assert_eq!(doc.get("config_path").unwrap().as_str(), Some(out.display().to_string().as_str()));
}

#[test]
fn test_missing_maxctl_fails_system_export() {
    let sys = common::writable_install();
    fs::remove_file(sys.path().join("etc/max.ctl")).unwrap();
    let config = sys.path().join("config");
    let err = export(sys.path(), &config, ExportFlags::SYSTEM).unwrap_err();
    assert!(err.to_string().starts_with("No max.ctl under"));
    // every general/ file written before maximus.toml is rolled back
    assert!(common::list_files(&config)
        .iter()
        .all(|f| f.starts_with(".txn-")));
}
