//! Canonical writer for [`Table`] trees.
//!
//! Within a table: scalars first in insertion order, then every table list
//! as `[[section.key]]` blocks, then every child table as `[section.key]`.
//! Parsing the output and emitting again yields the same text.

use std::fmt::Write;

use super::{Table, Value};

/// Quotes and escapes `s` with the escape set the parser understands.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c == '\x7f' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Bare keys stay bare; anything else is quoted.
pub fn format_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        escape_string(key)
    }
}

pub fn inline_str_list(items: &[String]) -> String {
    let parts: Vec<String> = items.iter().map(|s| escape_string(s)).collect();
    format!("[{}]", parts.join(", "))
}

pub fn inline_int_list(items: &[i64]) -> String {
    let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Single-line rendering of a value, used for scalars and inline tables.
pub fn inline_value(v: &Value) -> Option<String> {
    Some(match v {
        Value::Null => return None,
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) => escape_string(s),
        Value::StrList(l) => inline_str_list(l),
        Value::IntList(l) => inline_int_list(l),
        Value::Table(t) => {
            let parts: Vec<String> = t
                .iter()
                .filter_map(|(k, v)| inline_value(v).map(|s| format!("{} = {}", format_key(k), s)))
                .collect();
            if parts.is_empty() {
                "{}".to_string()
            } else {
                format!("{{ {} }}", parts.join(", "))
            }
        }
        Value::TableList(l) => {
            let parts: Vec<String> = l
                .iter()
                .filter_map(|t| inline_value(&Value::Table(t.clone())))
                .collect();
            format!("[{}]", parts.join(", "))
        }
    })
}

/// Renders `table` as a standalone document.
pub fn emit_table(table: &Table) -> String {
    let mut out = String::new();
    emit_section(&mut out, table, &[]);
    out
}

fn header(path: &[&str]) -> String {
    path.iter().map(|s| format_key(s)).collect::<Vec<_>>().join(".")
}

fn separate(out: &mut String) {
    if !out.is_empty() {
        out.push('\n');
    }
}

fn emit_section(out: &mut String, table: &Table, path: &[&str]) {
    for (k, v) in table.iter() {
        if v.is_container() {
            continue;
        }
        if let Some(s) = inline_value(v) {
            let _ = writeln!(out, "{} = {}", format_key(k), s);
        }
    }

    for (k, v) in table.iter() {
        if let Value::TableList(list) = v {
            let mut child: Vec<&str> = path.to_vec();
            child.push(k);
            for elem in list {
                separate(out);
                let _ = writeln!(out, "[[{}]]", header(&child));
                emit_section(out, elem, &child);
            }
        }
    }

    for (k, v) in table.iter() {
        if let Value::Table(t) = v {
            let mut child: Vec<&str> = path.to_vec();
            child.push(k);
            separate(out);
            let _ = writeln!(out, "[{}]", header(&child));
            emit_section(out, t, &child);
        }
    }
}
