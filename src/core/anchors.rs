//! Keeps every `&anchor` ahead of its `*alias` once sections have moved.
//!
//! Works on the text of each top-level section (key line first). When an
//! alias comes before the only definition of its anchor, the anchored node
//! moves to the alias and the old site becomes the alias instead.

use crate::core::document::{flow_depth, indentation, quoted_end, split_comment, split_key};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sigil {
    Anchor,
    Alias,
}

#[derive(Debug, Clone)]
struct Mark {
    sigil: Sigil,
    name: String,
    section: usize,
    line: usize,
    /// Column of the key or dash the node belongs to.
    owner: usize,
    /// Owner is a mapping key rather than a sequence dash.
    keyed: bool,
    start: usize,
    end: usize,
}

/// Returns the number of anchors moved.
pub(crate) fn relocate_anchors(sections: &mut [Vec<String>]) -> usize {
    let limit = scan(sections)
        .iter()
        .filter(|mark| mark.sigil == Sigil::Anchor)
        .count();

    let mut moved = 0;
    while moved < limit {
        let marks = scan(sections);
        let Some((alias, anchor)) = first_forward_alias(&marks) else {
            break;
        };
        if !move_anchor(sections, &alias, &anchor) {
            tracing::debug!("Anchor '{}' could not be moved ahead of its alias", anchor.name);
            break;
        }
        moved += 1;
    }
    moved
}

fn scan(sections: &[Vec<String>]) -> Vec<Mark> {
    let mut marks = Vec::new();

    for (section, lines) in sections.iter().enumerate() {
        let mut block_scalar: Option<usize> = None;

        for (index, line) in lines.iter().enumerate() {
            if let Some(owner) = block_scalar {
                if line.trim().is_empty() || indentation(line) > owner {
                    continue;
                }
                block_scalar = None;
            }

            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let Some((owner, keyed, start)) = node_start(line) else {
                continue;
            };

            let mut after = start;
            if let Some((sigil, end)) = mark_at(line, start) {
                marks.push(Mark {
                    sigil,
                    name: line[start + 1..end].to_string(),
                    section,
                    line: index,
                    owner,
                    keyed,
                    start,
                    end,
                });
                after = end;
            }
            if line[after..].trim_start().starts_with(['|', '>']) {
                block_scalar = Some(owner);
            }
        }
    }

    marks
}

/// `(owner column, keyed, byte offset where the value node starts)`.
fn node_start(line: &str) -> Option<(usize, bool, usize)> {
    let mut pos = indentation(line);
    let mut owner = pos;

    loop {
        let rest = &line[pos..];
        if rest == "-" {
            return None;
        }
        match rest.strip_prefix("- ") {
            Some(after) => {
                owner = pos;
                pos = line.len() - after.trim_start_matches([' ', '\t']).len();
            }
            None => break,
        }
    }

    match split_key(&line[pos..]) {
        Some((_, rest)) => {
            let value = rest.trim_start_matches([' ', '\t']);
            Some((pos, true, line.len() - value.len()))
        }
        None => Some((owner, false, pos)),
    }
}

fn mark_at(line: &str, start: usize) -> Option<(Sigil, usize)> {
    let sigil = match line[start..].chars().next()? {
        '&' => Sigil::Anchor,
        '*' => Sigil::Alias,
        _ => return None,
    };
    let name = &line[start + 1..];
    let len = name
        .find(|c: char| c.is_whitespace() || ",[]{}".contains(c))
        .unwrap_or(name.len());
    (len > 0).then_some((sigil, start + 1 + len))
}

fn first_forward_alias(marks: &[Mark]) -> Option<(Mark, Mark)> {
    let mut defined: HashSet<&str> = HashSet::new();

    for (i, mark) in marks.iter().enumerate() {
        match mark.sigil {
            Sigil::Anchor => {
                defined.insert(mark.name.as_str());
            }
            Sigil::Alias if !defined.contains(mark.name.as_str()) => {
                let anchor = marks[i + 1..]
                    .iter()
                    .find(|later| later.sigil == Sigil::Anchor && later.name == mark.name);
                if let Some(anchor) = anchor {
                    return Some((mark.clone(), anchor.clone()));
                }
            }
            Sigil::Alias => {}
        }
    }
    None
}

/// Index just past the last line of the node that starts on `line`.
fn node_end(lines: &[String], line: usize, owner: usize, keyed: bool) -> usize {
    let mut end = line + 1;
    for (index, text) in lines.iter().enumerate().skip(line + 1) {
        let width = indentation(text);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let inside = width > owner
            || (keyed && width == owner && (trimmed == "-" || trimmed.starts_with("- ")));
        if !inside {
            break;
        }
        end = index + 1;
    }
    end
}

fn move_anchor(sections: &mut [Vec<String>], alias: &Mark, anchor: &Mark) -> bool {
    let definition = sections[anchor.section][anchor.line].clone();
    let (value, comment) = split_comment(&definition[anchor.end..]);
    let header = value.trim();
    let end = node_end(
        &sections[anchor.section],
        anchor.line,
        anchor.owner,
        anchor.keyed,
    );
    let body = sections[anchor.section][anchor.line + 1..end].to_vec();

    if !body.is_empty() && !header.is_empty() && !header.starts_with(['|', '>']) {
        return false;
    }
    if body.is_empty() && !is_complete(header) {
        return false;
    }

    // the definition comes later, so editing it first keeps the alias index
    let lines = &mut sections[anchor.section];
    lines[anchor.line] = format!("{}*{}{}", &definition[..anchor.start], anchor.name, comment);
    lines.drain(anchor.line + 1..end);

    let usage = sections[alias.section][alias.line].clone();
    let properties = if header.is_empty() {
        format!("&{}", alias.name)
    } else {
        format!("&{} {}", alias.name, header)
    };
    let mut moved = vec![format!(
        "{}{}{}",
        &usage[..alias.start],
        properties,
        &usage[alias.end..]
    )];
    moved.extend(reindent(&body, alias.owner + 2));
    sections[alias.section].splice(alias.line..=alias.line, moved);
    true
}

/// A single-line value that does not continue on the next line.
fn is_complete(value: &str) -> bool {
    match value.chars().next() {
        None => true,
        Some('{' | '[') => flow_depth(value) == 0,
        Some(quote @ ('"' | '\'')) => quoted_end(value, quote).is_some(),
        Some('|' | '>') => false,
        Some(_) => true,
    }
}

fn reindent(lines: &[String], target: usize) -> Vec<String> {
    let base = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indentation(line))
        .min()
        .unwrap_or(target);

    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                return String::new();
            }
            let width = indentation(line);
            format!(
                "{}{}",
                " ".repeat((width + target).saturating_sub(base)),
                &line[width..]
            )
        })
        .collect()
}
