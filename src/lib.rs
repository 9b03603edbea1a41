//! # maxcfg - Maximus BBS configuration toolkit
//!
//! maxcfg reads and writes the configuration of a Maximus BBS install. The
//! classic install keeps its settings in keyword-oriented `.ctl` files, a
//! colour header and a packed `protocol.max`; the modern runtime reads a tree
//! of TOML files. This crate converts the former into the latter and gives
//! both tools and the runtime one typed way to read and edit the result.
//!
//! ## Features
//!
//! - **TOML documents**: a deterministic TOML subset parser/emitter, dotted
//!   path access (`areas.msg.area[0].name`) and an override layer that is
//!   only written back on explicit persist.
//! - **Typed views**: system, session, colours, menus, areas, protocols and
//!   the rest of the schema with canonical writers.
//! - **Legacy import**: `max.ctl`, `msgarea.ctl`, `filearea.ctl`,
//!   `access.ctl`, `menus.ctl`, `language.ctl`, `reader.ctl`, `colors.lh`,
//!   `protocol.ctl` and `protocol.max`.
//! - **Atomic export**: every file of a conversion is committed or the
//!   previous tree is restored.
//! - **MCI templates** and **language catalogs** for display strings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use maxcfg::export::{export, ExportFlags};
//! use maxcfg::document::Document;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let sys = Path::new("/opt/maximus");
//!     export(sys, &sys.join("config"), ExportFlags::all())?;
//!
//!     let mut doc = Document::new();
//!     doc.load_file(sys.join("config/maximus.toml"), "maximus")?;
//!     println!("{}", doc.get("maximus.system_name")?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`path`] - path resolution against a base directory
//! - [`value`] - TOML value tree, parser and emitter
//! - [`document`] - loaded documents with overrides and saving
//! - [`schema`] - typed configuration views
//! - [`legacy`] - readers for the classic control files
//! - [`export`] - transactional legacy-to-TOML export
//! - [`area_tree`] - division/area forest
//! - [`mci`] - MCI template engine
//! - [`lang`] - language string catalogs
//! - [`settings`] - settings of the `maxcfg` tool

pub mod area_tree;
pub mod document;
pub mod error;
pub mod export;
pub mod fsutil;
pub mod lang;
pub mod legacy;
pub mod logutil;
pub mod mci;
pub mod path;
pub mod schema;
pub mod settings;
pub mod value;
