//! Format-preserving view of a stack file.
//!
//! The file is parsed twice: once by `serde_yaml` for its values, and once
//! line by line into top-level [`Block`]s (leading comments, key line, body).
//! Rendering concatenates the blocks again, so any block that is not
//! replaced comes out exactly as it was read.

use crate::core::anchors;
use crate::core::annotate::extract_leading_comments;
use crate::core::emit;
use crate::utils::error::{Result, StackError};
use serde_yaml::{Mapping, Value};
use std::cmp::Ordering;

/// One `key: ...` entry of a block mapping together with the comment and
/// blank lines directly above it.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    key: Value,
    raw_key: String,
    inline_value: bool,
    lead: Vec<String>,
    head: String,
    body: Vec<String>,
}

impl Block {
    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn key_str(&self) -> Option<&str> {
        self.key.as_str()
    }

    /// The key exactly as written, quotes included.
    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    /// True when the key line carries its value (`key: value`, `key: {..}`)
    /// instead of opening an indented body.
    pub fn has_inline_value(&self) -> bool {
        self.inline_value
    }

    pub fn lead(&self) -> &[String] {
        &self.lead
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn lines(&self) -> impl Iterator<Item = &String> {
        self.lead
            .iter()
            .chain(std::iter::once(&self.head))
            .chain(self.body.iter())
    }

    /// Column of the key.
    pub fn indent(&self) -> usize {
        indentation(&self.head)
    }

    /// End-of-line comment of the key line, with the spacing before it.
    pub fn head_comment(&self) -> &str {
        let text = &self.head[self.indent() + self.raw_key.len()..];
        let rest = text
            .trim_start_matches([' ', '\t'])
            .strip_prefix(':')
            .unwrap_or("");
        split_comment(rest).1
    }

    /// The key line with its value replaced; the end-of-line comment stays.
    pub(crate) fn head_with_value(&self, value: &str) -> String {
        format!(
            "{}{}: {}{}",
            " ".repeat(self.indent()),
            self.raw_key,
            value,
            self.head_comment()
        )
    }

    /// Same key and leading comments, new key line and body.
    pub(crate) fn with_content(&self, head: String, body: Vec<String>) -> Block {
        let inline_value = split_key(&head[indentation(&head)..])
            .map(|(_, rest)| has_value(rest))
            .unwrap_or(false);

        Block {
            key: self.key.clone(),
            raw_key: self.raw_key.clone(),
            inline_value,
            lead: self.lead.clone(),
            head,
            body,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BlockSplit {
    pub blocks: Vec<Block>,
    pub trailing: Vec<String>,
}

/// Split `lines` into the entries of a block mapping whose keys sit at
/// column `indent`. Blank lines and comments at or left of `indent` that
/// precede a key become that key's lead; the ones after the last entry are
/// returned as `trailing`. A flow collection left open on a key line takes
/// every following line until it closes, whatever its indentation.
pub(crate) fn split_blocks<S: AsRef<str>>(lines: &[S], indent: usize) -> Result<BlockSplit> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut pending = Vec::new();
    let mut open_flow = 0;

    for line in lines {
        let line = line.as_ref();

        if open_flow > 0 {
            if let Some(block) = blocks.last_mut() {
                block.body.append(&mut pending);
                block.body.push(line.to_string());
                open_flow = (open_flow + flow_depth(line)).max(0);
                continue;
            }
        }

        let width = indentation(line);
        let text = &line[width..];

        if is_trivia(text, width, indent) {
            pending.push(line.to_string());
            continue;
        }

        match width.cmp(&indent) {
            Ordering::Equal => {
                let (raw_key, rest) = split_key(text).ok_or_else(|| {
                    StackError::unsupported(format!(
                        "expected a mapping key at column {}, found `{}`",
                        indent,
                        line.trim_end()
                    ))
                })?;
                let key = parse_key(raw_key)?;
                open_flow = flow_opening(rest);

                blocks.push(Block {
                    key,
                    raw_key: raw_key.to_string(),
                    inline_value: has_value(rest),
                    lead: std::mem::take(&mut pending),
                    head: line.to_string(),
                    body: Vec::new(),
                });
            }
            Ordering::Greater => {
                let block = blocks.last_mut().ok_or_else(|| {
                    StackError::unsupported(format!(
                        "indented content before the first key: `{}`",
                        line.trim_end()
                    ))
                })?;
                block.body.append(&mut pending);
                block.body.push(line.to_string());
            }
            Ordering::Less => {
                return Err(StackError::unsupported(format!(
                    "unexpected dedent: `{}`",
                    line.trim_end()
                )));
            }
        }
    }

    Ok(BlockSplit {
        blocks,
        trailing: pending,
    })
}

/// Blocks carry exactly the keys of `mapping`, in order.
pub(crate) fn keys_match(blocks: &[Block], mapping: &Mapping) -> bool {
    blocks.len() == mapping.len()
        && blocks
            .iter()
            .zip(mapping.iter())
            .all(|(block, (key, _))| block.key() == key)
}

/// Indentation of the first line that is neither blank nor a comment.
pub(crate) fn content_indent<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines
        .iter()
        .map(|line| AsRef::<str>::as_ref(line))
        .find(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#') && !is_document_marker(trimmed)
        })
        .map(indentation)
}

pub(crate) fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_trivia(text: &str, width: usize, indent: usize) -> bool {
    text.trim().is_empty()
        || (text.starts_with('#') && width <= indent)
        || (width == 0 && is_document_marker(text))
}

fn is_document_marker(text: &str) -> bool {
    text.starts_with('%')
        || ["---", "..."].iter().any(|marker| {
            text.strip_prefix(*marker)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
        })
}

fn has_value(rest: &str) -> bool {
    let rest = rest.trim();
    !rest.is_empty() && !rest.starts_with('#')
}

/// Split `key: rest` into the raw key and whatever follows the colon.
pub(crate) fn split_key(text: &str) -> Option<(&str, &str)> {
    let key_end = match text.chars().next()? {
        '"' => quoted_end(text, '"')?,
        '\'' => quoted_end(text, '\'')?,
        '[' | '{' | '?' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`' | '#' => return None,
        '-' if text.len() == 1 || text[1..].starts_with([' ', '\t']) => return None,
        _ => {
            for (i, c) in text.char_indices() {
                if c == '#' && text[..i].ends_with([' ', '\t']) {
                    return None;
                }
                if c == ':' {
                    let rest = &text[i + 1..];
                    if rest.is_empty() || rest.starts_with([' ', '\t']) {
                        let key = text[..i].trim_end();
                        return (!key.is_empty()).then_some((key, rest));
                    }
                }
            }
            return None;
        }
    };

    let rest = text[key_end..]
        .trim_start_matches([' ', '\t'])
        .strip_prefix(':')?;
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((&text[..key_end], rest))
}

/// Byte offset just past the closing quote.
pub(crate) fn quoted_end(text: &str, quote: char) -> Option<usize> {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if quote == '"' && c == '\\' {
            chars.next();
            continue;
        }
        if c == quote {
            if quote == '\'' && matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                continue;
            }
            return Some(i + c.len_utf8());
        }
    }
    None
}

/// Feed every character outside quoted scalars to `visit`. Returns the
/// byte offset of the `#` that starts a comment, if any.
fn scan_unquoted(text: &str, mut visit: impl FnMut(char)) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut closed_single = false;
    let mut prev: Option<char> = None;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if q == '"' && c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
                closed_single = q == '\'';
            }
        } else if closed_single && c == '\'' {
            // '' inside a single-quoted scalar
            quote = Some('\'');
            closed_single = false;
        } else {
            closed_single = false;
            let boundary = prev.map_or(true, |p| p.is_whitespace() || "[{,".contains(p));
            match c {
                '#' if prev.map_or(true, char::is_whitespace) => return Some(i),
                '"' | '\'' if boundary => quote = Some(c),
                _ => visit(c),
            }
        }
        prev = Some(c);
    }
    None
}

/// `(value, comment)`; the comment keeps the whitespace in front of it.
pub(crate) fn split_comment(text: &str) -> (&str, &str) {
    match scan_unquoted(text, |_| {}) {
        Some(i) => text.split_at(text[..i].trim_end_matches([' ', '\t']).len()),
        None => (text, ""),
    }
}

/// Net number of flow collections opened on this line.
pub(crate) fn flow_depth(text: &str) -> i32 {
    let mut depth = 0;
    scan_unquoted(text, |c| match c {
        '{' | '[' => depth += 1,
        '}' | ']' => depth -= 1,
        _ => {}
    });
    depth
}

fn flow_opening(rest: &str) -> i32 {
    let mut value = rest.trim_start();
    // node properties: &anchor, !tag
    while value.starts_with(['&', '!']) {
        value = value
            .split_once([' ', '\t'])
            .map_or("", |(_, tail)| tail.trim_start());
    }
    if value.starts_with(['{', '[']) {
        flow_depth(value).max(0)
    } else {
        0
    }
}

fn parse_key(raw_key: &str) -> Result<Value> {
    let probe: Mapping = serde_yaml::from_str(&format!("{}: null", raw_key))?;
    probe
        .into_iter()
        .next()
        .map(|(key, _)| key)
        .ok_or_else(|| StackError::unsupported(format!("cannot read key `{}`", raw_key)))
}

/// Move every key of `priority` that is present to the front, in
/// `priority` order. Everything else keeps its relative order.
pub fn move_keys_to_front<T>(
    items: &mut Vec<T>,
    priority: &[&str],
    key_of: impl Fn(&T) -> Option<&str>,
) {
    for wanted in priority.iter().rev() {
        if let Some(pos) = items.iter().position(|item| key_of(item) == Some(*wanted)) {
            let item = items.remove(pos);
            items.insert(0, item);
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackDocument {
    header: Vec<String>,
    preamble: Vec<String>,
    sections: Vec<Block>,
    epilogue: Vec<String>,
    root: Mapping,
    newline: &'static str,
    final_newline: bool,
}

impl StackDocument {
    pub fn parse(raw: &str) -> Result<Self> {
        let has_content = raw.lines().any(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        });

        let root = if has_content {
            match serde_yaml::from_str::<Value>(raw)? {
                Value::Mapping(mapping) => mapping,
                Value::Null => Mapping::new(),
                other => {
                    return Err(StackError::unsupported(format!(
                        "top-level node is {}, expected a mapping",
                        describe(&other)
                    )))
                }
            }
        } else {
            Mapping::new()
        };

        let header = extract_leading_comments(raw);
        let lines: Vec<&str> = raw.lines().skip(header.len()).collect();
        let indent = content_indent(&lines).unwrap_or(0);

        let layout = split_blocks(&lines, indent)
            .ok()
            .filter(|split| keys_match(&split.blocks, &root));
        let BlockSplit {
            mut blocks,
            trailing,
        } = match layout {
            Some(split) => split,
            None => {
                tracing::debug!("top-level layout not recognized, emitting the document in block style");
                let mut emitted = Vec::new();
                emit::emit_mapping_entries(&root, 0, &mut emitted);
                let split = split_blocks(&emitted, 0)?;
                if !keys_match(&split.blocks, &root) {
                    return Err(StackError::unsupported(
                        "top-level keys could not be matched against the file text",
                    ));
                }
                split
            }
        };

        let preamble = blocks
            .first_mut()
            .map(|first| std::mem::take(&mut first.lead))
            .unwrap_or_default();

        Ok(Self {
            header,
            preamble,
            sections: blocks,
            epilogue: trailing,
            root,
            newline: if raw.contains("\r\n") { "\r\n" } else { "\n" },
            final_newline: raw.is_empty() || raw.ends_with('\n'),
        })
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn set_header(&mut self, lines: Vec<String>) {
        self.header = lines;
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.sections.iter().map(Block::key)
    }

    pub fn section(&self, key: &str) -> Option<&Block> {
        self.sections
            .iter()
            .find(|section| section.key_str() == Some(key))
    }

    /// Swap in a rewritten section and its new value. The key must already
    /// exist; position is kept.
    pub(crate) fn replace_section(&mut self, block: Block, value: Value) -> Result<()> {
        let slot = self
            .sections
            .iter_mut()
            .find(|section| section.key == block.key)
            .ok_or_else(|| StackError::unsupported("replaced section does not exist"))?;
        self.root.insert(block.key.clone(), value);
        *slot = block;
        Ok(())
    }

    /// Move the `priority` keys to the front. An anchor that would end up
    /// after one of its aliases moves to that alias.
    pub fn reorder(&mut self, priority: &[&str]) {
        move_keys_to_front(&mut self.sections, priority, Block::key_str);

        let mut texts: Vec<Vec<String>> = self
            .sections
            .iter()
            .map(|section| {
                std::iter::once(section.head.clone())
                    .chain(section.body.iter().cloned())
                    .collect()
            })
            .collect();
        let moved = anchors::relocate_anchors(&mut texts);
        if moved > 0 {
            tracing::debug!("Moved {} anchor(s) ahead of their aliases", moved);
            for (section, mut text) in self.sections.iter_mut().zip(texts) {
                let head = text.remove(0);
                *section = section.with_content(head, text);
            }
        }

        let reordered: Mapping = self
            .sections
            .iter()
            .filter_map(|section| {
                self.root
                    .get(&section.key)
                    .map(|value| (section.key.clone(), value.clone()))
            })
            .collect();
        self.root = reordered;
    }

    /// Lines are joined with the line ending the file was read with; the
    /// final newline is only written when the file had one.
    pub fn render(&self) -> String {
        let lines: Vec<&str> = self
            .header
            .iter()
            .chain(self.preamble.iter())
            .chain(self.sections.iter().flat_map(Block::lines))
            .chain(self.epilogue.iter())
            .map(String::as_str)
            .collect();

        let mut out = lines.join(self.newline);
        if self.final_newline && !lines.is_empty() {
            out.push_str(self.newline);
        }
        out
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
