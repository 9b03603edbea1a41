use maxcfg::document::Document;
use maxcfg::mci::{strip, InfoCode, Param, ParseFlags, StaticInfo, StripFlags, TemplateContext, Theme};
use maxcfg::value::parse_str;

#[test]
fn test_positional_resolved_before_fill() {
    let mut ctx = TemplateContext::new();
    let out = ctx.expand("$X|!1-|CR", &[Param::from(10)]);
    assert_eq!(out, format!("{}\r\n", "-".repeat(9)));
    assert_eq!(ctx.column(), 1);
}

#[test]
fn test_info_codes_and_theme() {
    let info = StaticInfo::new().with(InfoCode::UserName, "Jo");
    let mut ctx = TemplateContext::new().with_info(&info);
    assert_eq!(ctx.expand("|15Hi |UN!", &[]), "|15Hi Jo!");
    assert_eq!(ctx.column(), 7);

    ctx.set_column(1);
    assert_eq!(ctx.expand("|hiX|tx", &[]), "|15X|07");
    // no value for the code: left as written
    assert_eq!(ctx.expand("|BN", &[]), "|BN");
}

#[test]
fn test_scoped_flags_restore() {
    let info = StaticInfo::new().with(InfoCode::UserName, "Jo");
    let mut ctx = TemplateContext::new().with_info(&info);
    {
        let mut guard = ctx.scoped_flags(ParseFlags::MCI_CODES, ParseFlags::empty());
        assert_eq!(guard.expand("|UN", &[]), "|UN");
    }
    assert_eq!(ctx.flags(), ParseFlags::all());
    assert_eq!(ctx.expand("|UN", &[]), "Jo");
}

#[test]
fn test_strip_leaves_no_codes() {
    let src = "|15Hi |tx|UN|!1 $L10x|PD[K";
    let out = strip(src, StripFlags::all());
    assert_eq!(out, "Hi  x");
    for code in ["|1", "|t", "|U", "|!", "$L", "|PD", "[K"] {
        assert!(!out.contains(code), "{} left in {:?}", code, out);
    }
}

#[test]
fn test_strip_escaped_bar_leaves_no_codes() {
    for src in ["a||14b", "||||07x", "|||hiy", "name||UN", "[$L10K", "|$T0503z"] {
        let out = strip(src, StripFlags::all());
        let chars: Vec<char> = out.chars().collect();
        for w in chars.windows(3) {
            let digits = w[1].is_ascii_digit() && w[2].is_ascii_digit();
            let letters = w[1].is_ascii_alphabetic() && w[2].is_ascii_alphabetic();
            assert!(!(w[0] == '|' && (digits || letters)), "{:?} -> {:?}", src, out);
        }
        assert!(!out.contains("[K"), "{:?} -> {:?}", src, out);
    }
    assert_eq!(strip("a||14b", StripFlags::all()), "a|b");
}

#[test]
fn test_attr_second_pass_is_stable() {
    let ctx = TemplateContext::new();
    for s in ["|14|17", "|hi", "|03", "plain"] {
        let once = ctx.to_attr(s, 0x07);
        assert_eq!(ctx.to_attr(s, once), once, "{}", s);
    }
    assert_eq!(ctx.to_attr("|14", 0x07) & 0x0f, 14);
}

#[test]
fn test_theme_from_document() {
    let table = parse_str(
        "[theme]\nname = \"night\"\n\n[theme.colors]\ntext = \"|03\"\nhighlight = \"|07|tx\"\n",
        "colors.toml",
    )
    .unwrap();
    let mut doc = Document::new();
    doc.mount(table, "general.colors").unwrap();

    let theme = Theme::from_document(&doc, "general.colors").unwrap();
    assert_eq!(theme.name, "night");
    assert_eq!(theme.get("text"), Some("|03"));
    // a value pointing at another theme code is refused
    assert_eq!(theme.get("highlight"), Theme::default().get("highlight"));

    let mut ctx = TemplateContext::new().with_theme(Some(theme));
    assert_eq!(ctx.expand("|txA", &[]), "|03A");
}
