//! # MCI template engine
//!
//! Expands the pipe-code markup used throughout Maximus prompts and display
//! strings:
//!
//! - `|00`..`|31` numeric colours and `|xx` themed colours (see [`Theme`])
//! - `|XY` information codes (board name, user name, date, ...)
//! - `|!1`..`|!F` positional parameters
//! - `$`-format operators (`$L20`, `$c30-`, `$D05=`, `$X40.`, `$T08`) and `|PD`
//! - cursor codes (`[K`, `[X10`, `|CR`, `|CL`, ...)
//!
//! All engine state lives in a [`TemplateContext`]: the active parse flags and
//! their push/pop stack, the theme, the information source and the current
//! output column.
//!
//! ```
//! use maxcfg::mci::{Param, TemplateContext};
//!
//! let mut ctx = TemplateContext::new();
//! let out = ctx.expand("$X|!1-|CR", &[Param::from("10")]);
//! assert_eq!(out, "---------\r\n");
//! assert_eq!(ctx.column(), 1);
//! ```

pub mod attr;
mod expand;
mod strip;
pub mod theme;

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use bitflags::bitflags;
use chrono::NaiveDateTime;

pub use expand::visible_len;
pub use strip::strip;
pub use theme::{Theme, ThemeSlot};

bitflags! {
    /// Token classes [`TemplateContext::expand`] interprets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParseFlags: u32 {
        const PIPE_COLORS = 0x01;
        const MCI_CODES = 0x02;
        const FORMAT_OPS = 0x04;
    }
}

bitflags! {
    /// Token classes removed by [`strip`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StripFlags: u32 {
        const COLORS = 0x01;
        const INFO = 0x02;
        const FORMAT = 0x04;
    }
}

impl Default for ParseFlags {
    fn default() -> Self {
        ParseFlags::all()
    }
}

/// Positional parameters `|!1`..`|!F`.
pub const MAX_PARAMS: usize = 15;

const FLAG_STACK_MAX: usize = 16;

/// A typed `|!N` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Str(String),
    I32(i32),
    I64(i64),
    U32(u32),
    Char(char),
}

impl Param {
    /// Renders the value under an optional `c`/`d`/`l`/`u` suffix hint.
    pub fn render(&self, hint: Option<char>) -> String {
        match (hint, self) {
            (Some('c'), Param::Str(s)) => s.chars().next().map(String::from).unwrap_or_default(),
            (Some('c'), Param::I32(n)) => char_of(i64::from(*n)),
            (Some('c'), Param::I64(n)) => char_of(*n),
            (Some('c'), Param::U32(n)) => char_of(i64::from(*n)),
            (Some('u'), Param::I32(n)) => (*n as u32).to_string(),
            (Some('d'), Param::U32(n)) => (*n as i32).to_string(),
            (Some('d'), Param::I64(n)) => (*n as i32).to_string(),
            (Some('d' | 'l' | 'u'), Param::Char(c)) => u32::from(*c).to_string(),
            _ => self.to_string(),
        }
    }
}

fn char_of(n: i64) -> String {
    u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_default()
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Str(s) => f.write_str(s),
            Param::I32(n) => write!(f, "{}", n),
            Param::I64(n) => write!(f, "{}", n),
            Param::U32(n) => write!(f, "{}", n),
            Param::Char(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Str(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Str(s)
    }
}

impl From<i32> for Param {
    fn from(n: i32) -> Self {
        Param::I32(n)
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::I64(n)
    }
}

impl From<u32> for Param {
    fn from(n: u32) -> Self {
        Param::U32(n)
    }
}

impl From<char> for Param {
    fn from(c: char) -> Self {
        Param::Char(c)
    }
}

/// Information codes (`|XY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoCode {
    BoardName,
    SysopName,
    UserName,
    UserAlias,
    RealName,
    City,
    Phone,
    DataPhone,
    Calls,
    CallerNumber,
    MsgsPosted,
    KbDown,
    KbUp,
    FilesDown,
    FilesUp,
    KbToday,
    TimeLeft,
    ScreenLength,
    TermEmulation,
    Date,
    Time,
    TimeSeconds,
    UserNumber,
    MsgArea,
    MsgAreaDesc,
    FileArea,
    FileAreaDesc,
}

impl InfoCode {
    pub fn from_pair(a: char, b: char) -> Option<Self> {
        use InfoCode::*;
        Some(match (a, b) {
            ('B', 'N') => BoardName,
            ('S', 'N') => SysopName,
            ('U', 'N') => UserName,
            ('U', 'H') => UserAlias,
            ('U', 'R') => RealName,
            ('U', 'C') => City,
            ('U', 'P') => Phone,
            ('U', 'D') => DataPhone,
            ('C', 'S') => Calls,
            ('C', 'T') => CallerNumber,
            ('M', 'P') => MsgsPosted,
            ('D', 'K') => KbDown,
            ('F', 'K') => KbUp,
            ('D', 'L') => FilesDown,
            ('F', 'U') => FilesUp,
            ('D', 'T') => KbToday,
            ('T', 'L') => TimeLeft,
            ('U', 'S') => ScreenLength,
            ('T', 'E') => TermEmulation,
            ('D', 'A') => Date,
            ('T', 'M') => Time,
            ('T', 'S') => TimeSeconds,
            ('U', '#') => UserNumber,
            ('M', 'B') => MsgArea,
            ('M', 'D') => MsgAreaDesc,
            ('F', 'B') => FileArea,
            ('F', 'D') => FileAreaDesc,
            _ => return None,
        })
    }
}

/// Source of information-code values.
///
/// Date and time codes are formatted by the engine from [`TemplateInfo::now`];
/// every other code comes from [`TemplateInfo::text`]. An empty or missing
/// value leaves the code in the output untouched.
pub trait TemplateInfo {
    fn text(&self, code: InfoCode) -> Option<String>;

    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Fixed values, mostly for tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticInfo {
    values: HashMap<InfoCode, String>,
    now: Option<NaiveDateTime>,
}

impl StaticInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: InfoCode, value: impl Into<String>) -> Self {
        self.values.insert(code, value.into());
        self
    }

    /// Pins the clock used by `|DA`, `|TM` and `|TS`.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }
}

impl TemplateInfo for StaticInfo {
    fn text(&self, code: InfoCode) -> Option<String> {
        self.values.get(&code).cloned()
    }

    fn now(&self) -> NaiveDateTime {
        self.now
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }
}

/// Engine state for one output stream.
pub struct TemplateContext<'a> {
    flags: ParseFlags,
    stack: Vec<ParseFlags>,
    theme: Option<Theme>,
    info: Option<&'a dyn TemplateInfo>,
    column: u32,
}

impl Default for TemplateContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TemplateContext<'a> {
    /// All token classes enabled, default theme, no information source,
    /// column 1.
    pub fn new() -> Self {
        Self {
            flags: ParseFlags::all(),
            stack: Vec::new(),
            theme: Some(Theme::default()),
            info: None,
            column: 1,
        }
    }

    pub fn with_theme(mut self, theme: Option<Theme>) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_info(mut self, info: &'a dyn TemplateInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    pub fn set_theme(&mut self, theme: Option<Theme>) {
        self.theme = theme;
    }

    pub fn flags(&self) -> ParseFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: ParseFlags) {
        self.flags = flags;
    }

    /// 1-based output column, updated by every expansion.
    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn set_column(&mut self, column: u32) {
        self.column = column.max(1);
    }

    /// Saves the current flags and replaces the bits in `mask` with those
    /// from `values`. Returns false, changing nothing, once the stack is full.
    pub fn push_flags(&mut self, mask: ParseFlags, values: ParseFlags) -> bool {
        if self.stack.len() >= FLAG_STACK_MAX {
            return false;
        }
        self.stack.push(self.flags);
        self.flags = (self.flags & !mask) | (values & mask);
        true
    }

    /// Restores the flags saved by the matching push. No-op on an empty stack.
    pub fn pop_flags(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.flags = prev;
        }
    }

    /// Scoped [`push_flags`](Self::push_flags); the flags are restored when
    /// the guard drops.
    pub fn scoped_flags<'c>(&'c mut self, mask: ParseFlags, values: ParseFlags) -> FlagGuard<'c, 'a> {
        let pushed = self.push_flags(mask, values);
        FlagGuard { ctx: self, pushed }
    }

    /// Attribute byte for a colour string, resolving themed codes.
    pub fn to_attr(&self, s: &str, base: u8) -> u8 {
        attr::themed_attr(s, base, self.theme.as_ref())
    }
}

pub struct FlagGuard<'c, 'a> {
    ctx: &'c mut TemplateContext<'a>,
    pushed: bool,
}

impl<'a> Deref for FlagGuard<'_, 'a> {
    type Target = TemplateContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'a> DerefMut for FlagGuard<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for FlagGuard<'_, '_> {
    fn drop(&mut self) {
        if self.pushed {
            self.ctx.pop_flags();
        }
    }
}
