//! Block-style YAML emitter for the subtrees the tool rewrites.
//!
//! Mappings indent by two spaces, sequence dashes sit two spaces in from
//! their parent key with item content at four, and lines are never wrapped.

use serde_yaml::{Mapping, Value};

pub const MAPPING_INDENT: usize = 2;
pub const SEQUENCE_OFFSET: usize = 2;

pub fn emit_mapping_entries(mapping: &Mapping, indent: usize, out: &mut Vec<String>) {
    for (key, value) in mapping {
        emit_entry(&scalar_key(key), value, indent, out);
    }
}

pub fn emit_entry(key: &str, value: &Value, indent: usize, out: &mut Vec<String>) {
    let pad = " ".repeat(indent);
    match value {
        Value::Mapping(mapping) if !mapping.is_empty() => {
            out.push(format!("{}{}:", pad, key));
            emit_mapping_entries(mapping, indent + MAPPING_INDENT, out);
        }
        Value::Sequence(items) if !items.is_empty() => {
            out.push(format!("{}{}:", pad, key));
            emit_sequence_items(items, indent + SEQUENCE_OFFSET, out);
        }
        other => out.push(format!("{}{}: {}", pad, key, inline(other, false))),
    }
}

fn emit_sequence_items(items: &[Value], dash_indent: usize, out: &mut Vec<String>) {
    let pad = " ".repeat(dash_indent);
    for item in items {
        match item {
            Value::Mapping(mapping) if !mapping.is_empty() => {
                let first = out.len();
                emit_mapping_entries(mapping, dash_indent + 2, out);
                out[first].replace_range(dash_indent..dash_indent + 2, "- ");
            }
            Value::Sequence(nested) if !nested.is_empty() => {
                out.push(format!("{}-", pad));
                emit_sequence_items(nested, dash_indent + SEQUENCE_OFFSET, out);
            }
            other => out.push(format!("{}- {}", pad, inline(other, false))),
        }
    }
}

fn scalar_key(key: &Value) -> String {
    inline(key, false)
}

/// Render a value on a single line. Collections fall back to flow style.
pub fn inline(value: &Value, flow: bool) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => scalar(s, flow),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(|item| inline(item, true)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(mapping) => {
            if mapping.is_empty() {
                return "{}".to_string();
            }
            let entries: Vec<String> = mapping
                .iter()
                .map(|(k, v)| format!("{}: {}", inline(k, true), inline(v, true)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, inline(&tagged.value, flow)),
    }
}

/// Plain when the text reads back as the same string, double-quoted
/// otherwise (so `"3"` and `"false"` stay strings).
pub fn scalar(s: &str, flow: bool) -> String {
    if is_plain_safe(s, flow) {
        s.to_string()
    } else {
        double_quoted(s)
    }
}

fn is_plain_safe(s: &str, flow: bool) -> bool {
    let first = match s.chars().next() {
        Some(c) => c,
        None => return false,
    };
    if s != s.trim() || s.chars().any(char::is_control) {
        return false;
    }
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    if flow && s.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(ref parsed)) if parsed == s)
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
