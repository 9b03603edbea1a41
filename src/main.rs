//! Binary entrypoint for the `maxcfg` CLI.
//!
//! Commands:
//! - `export [--sys <dir>] [--config <dir>] [--only menus,msg,file,system]` - convert a legacy install to TOML
//! - `export-from-ctl <max.ctl> [--config <dir>]` - same, locating the install from `max.ctl`
//! - `get <file.toml> <path> [--prefix p] [--json]` - print one value
//! - `set <file.toml> <path> <value> [--prefix p]` - change one value and save the file
//! - `expand <text> [--param v]... [--info XY=v]... [--strip]` - run the MCI template engine
//! - `lang <key|#id> [--file lang.toml] [--rip]` - resolve a language string
//!
//! See the library crate docs for module-level details: `maxcfg::`.
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};

use maxcfg::document::Document;
use maxcfg::export::{self, ExportFlags};
use maxcfg::lang::LangCatalog;
use maxcfg::mci::{self, InfoCode, Param, StaticInfo, StripFlags, TemplateContext};
use maxcfg::settings::Settings;
use maxcfg::value::{Value, ValueRef};

#[derive(Parser)]
#[command(name = "maxcfg")]
#[command(about = "Maximus configuration toolkit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to ./maxcfg.toml when present)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a legacy install to the TOML configuration tree
    Export {
        /// System directory holding etc/ (overrides settings)
        #[arg(long)]
        sys: Option<PathBuf>,
        /// Output directory (default: <sys>/config)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated subset: menus, msg, file, system, all
        #[arg(long, default_value = "all")]
        only: String,
    },
    /// Export using the install that owns a max.ctl
    ExportFromCtl {
        maxctl: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "all")]
        only: String,
    },
    /// Print the value at a dotted path
    Get {
        file: PathBuf,
        path: String,
        /// Prefix the file is mounted under
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long)]
        json: bool,
    },
    /// Set the value at a dotted path and save the file
    Set {
        file: PathBuf,
        path: String,
        value: String,
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Expand MCI codes in a string
    Expand {
        text: String,
        /// Positional parameter |!1, |!2, ... in order
        #[arg(short, long = "param")]
        params: Vec<String>,
        /// Information code value, e.g. UN=Sysop
        #[arg(short, long = "info")]
        info: Vec<String>,
        /// Strip every code instead of expanding
        #[arg(long)]
        strip: bool,
    },
    /// Look up a language string by key or #id
    Lang {
        key: String,
        /// Language file (default from settings)
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        rip: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.settings.as_deref())?;
    init_logging(&settings, cli.verbose);
    debug!("settings: {:?}", settings);

    match cli.command {
        Commands::Export { sys, config, only } => {
            let sys = sys.unwrap_or_else(|| settings.sys_path.clone());
            let config = config.unwrap_or_else(|| sys.join("config"));
            let flags = parse_flags(&only)?;
            export::export(&sys, &config, flags).map_err(|e| anyhow!("{}", e))?;
            println!("Exported {} to {}", sys.display(), config.display());
        }
        Commands::ExportFromCtl { maxctl, config, only } => {
            let config = match config {
                Some(c) => c,
                None => export::sys_dir_of_maxctl(&maxctl)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("config"),
            };
            let flags = parse_flags(&only)?;
            export::export_from_maxctl(&maxctl, &config, flags).map_err(|e| anyhow!("{}", e))?;
            println!("Exported {} to {}", maxctl.display(), config.display());
        }
        Commands::Get { file, path, prefix, json } => {
            let doc = load_doc(&file, &prefix)?;
            let v = doc
                .get(&path)
                .with_context(|| format!("{} in {}", path, file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&to_json(v))?);
            } else {
                println!("{}", v);
            }
        }
        Commands::Set { file, path, value, prefix } => {
            let mut doc = load_doc(&file, &prefix)?;
            match infer_value(&value) {
                Value::Bool(b) => doc.set_bool(&path, b)?,
                Value::Int(i) => doc.set_int(&path, i)?,
                Value::StrList(l) => doc.set_string_list(&path, l.as_slice())?,
                _ => doc.set_string(&path, &value)?,
            }
            doc.persist_one(&path)?;
            doc.save_prefix(&prefix)
                .with_context(|| format!("saving {}", file.display()))?;
            info!("{} = {} saved to {}", path, value, file.display());
        }
        Commands::Expand { text, params, info, strip } => {
            if strip {
                println!("{}", mci::strip(&text, StripFlags::all()));
                return Ok(());
            }
            let source = info_source(&info)?;
            let params: Vec<Param> = params.into_iter().map(Param::from).collect();
            let mut ctx = TemplateContext::new().with_info(&source);
            let out = ctx.expand(&text, &params);
            if atty::is(atty::Stream::Stdout) {
                println!("{}", out);
            } else {
                println!("{}", mci::strip(&out, StripFlags::COLORS));
            }
        }
        Commands::Lang { key, file, rip } => {
            let file = file.unwrap_or_else(|| settings.default_lang_path());
            let mut cat = LangCatalog::open(&file)
                .with_context(|| format!("opening {}", file.display()))?;
            cat.set_use_rip(rip || settings.rip);
            let s = match key.strip_prefix('#') {
                Some(id) => cat.get_by_id(parse_id(id)?),
                None => cat.get(&key),
            };
            println!("{}", s);
        }
    }

    Ok(())
}

fn parse_flags(only: &str) -> Result<ExportFlags> {
    match ExportFlags::parse_list(only) {
        Some(f) if !f.is_empty() => Ok(f),
        _ => bail!("unknown export subset '{}'", only),
    }
}

fn load_doc(file: &Path, prefix: &str) -> Result<Document> {
    let mut doc = Document::new();
    doc.load_file(file, prefix)
        .with_context(|| format!("loading {}", file.display()))?;
    Ok(doc)
}

/// `#12` or `#0x000c`.
fn parse_id(s: &str) -> Result<usize> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| anyhow!("bad string id '{}'", s))
}

/// Types a command-line value by its shape: `true`/`false`, an integer,
/// a `[a, b]` list, or a plain string.
fn infer_value(s: &str) -> Value {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true") || t.eq_ignore_ascii_case("false") {
        return Value::Bool(t.eq_ignore_ascii_case("true"));
    }
    if let Ok(i) = t.parse::<i64>() {
        return Value::Int(i);
    }
    if let Some(body) = t.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        let items = body
            .split(',')
            .map(|p| p.trim().trim_matches('"').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        return Value::StrList(items);
    }
    Value::Str(s.to_string())
}

fn info_source(pairs: &[String]) -> Result<StaticInfo> {
    let mut source = StaticInfo::new();
    for pair in pairs {
        let (code, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected XY=value, got '{}'", pair))?;
        let mut c = code.chars();
        let parsed = match (c.next(), c.next(), c.next()) {
            (Some(a), Some(b), None) => InfoCode::from_pair(a, b),
            _ => None,
        };
        let code = parsed.ok_or_else(|| anyhow!("unknown information code '{}'", code))?;
        source = source.with(code, value);
    }
    Ok(source)
}

fn to_json(v: ValueRef<'_>) -> serde_json::Value {
    use serde_json::Value as J;
    match v {
        ValueRef::Null => J::Null,
        ValueRef::Int(i) => J::from(i),
        ValueRef::Uint(u) => J::from(u),
        ValueRef::Bool(b) => J::Bool(b),
        ValueRef::Str(s) => J::from(s),
        ValueRef::StrList(l) => J::from(l.to_vec()),
        ValueRef::IntList(l) => J::from(l.to_vec()),
        ValueRef::Table(t) => J::Object(
            t.iter()
                .map(|(k, v)| (k.to_string(), to_json(v.as_ref())))
                .collect(),
        ),
        ValueRef::TableList(l) => J::Array(l.iter().map(|t| to_json(ValueRef::Table(t))).collect()),
    }
}

fn init_logging(settings: &Settings, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = settings.log_file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // echo to the console only when someone is watching
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_value_shapes() {
        assert_eq!(infer_value("TRUE"), Value::Bool(true));
        assert_eq!(infer_value("-12"), Value::Int(-12));
        assert_eq!(
            infer_value("[\"Squish\", Local]"),
            Value::StrList(vec!["Squish".into(), "Local".into()])
        );
        assert_eq!(infer_value("Night Owl"), Value::Str("Night Owl".into()));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert_eq!(parse_id("0x000c").unwrap(), 12);
        assert!(parse_id("zz").is_err());
    }

    #[test]
    fn test_info_source() {
        assert!(info_source(&["UN=Sysop".to_string()]).is_ok());
        assert!(info_source(&["UN".to_string()]).is_err());
        assert!(info_source(&["ZZ=x".to_string()]).is_err());
    }
}
