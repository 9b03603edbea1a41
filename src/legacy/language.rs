//! `etc/language.ctl`: the installed language files.

use std::path::Path;

use crate::error::Result;
use crate::schema::Language;

use super::CtlFile;

/// Reads `Max Languages` and every `Language <file>` line. The heap sizing
/// fields stay zero; they are computed when the catalogs are loaded.
pub fn read_language(ctl: &CtlFile) -> Language {
    Language {
        max_lang: ctl.int("Max Languages").unwrap_or(0),
        lang_files: ctl
            .find_all("Language")
            .filter(|v| !v.is_empty() && *v != "Section")
            .map(str::to_string)
            .collect(),
        ..Language::default()
    }
}

pub fn parse_language_ctl(sys_dir: &Path) -> Result<Language> {
    let ctl = CtlFile::load(&sys_dir.join("etc").join("language.ctl"))?;
    Ok(read_language(&ctl))
}
