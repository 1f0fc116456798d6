use crate::core::document::{content_indent, keys_match, split_blocks, Block, StackDocument};
use crate::core::emit;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, StackError};
use regex::Regex;
use serde_yaml::{Mapping, Value};

pub const VOLUMES_KEY: &str = "volumes";

const VOLUME_NAME_PREFIX: &str = r"^[A-Za-z0-9_-]+";
const VOLUME_NAME_FULL: &str = r"^[A-Za-z0-9_-]+$";

pub fn build_voluri(nodes: &[String], base_path: &str) -> String {
    nodes
        .iter()
        .map(|node| format!("{}:{}", node, base_path))
        .collect::<Vec<_>>()
        .join(",")
}

/// Rewrites eligible entries of a stack's `volumes` section to the
/// GlusterFS driver.
#[derive(Debug, Clone)]
pub struct VolumeConverter {
    driver: String,
    voluri: String,
    replicate: String,
    read_only: String,
    name_pattern: Regex,
}

impl VolumeConverter {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let pattern = if config.strict_volume_names() {
            VOLUME_NAME_FULL
        } else {
            VOLUME_NAME_PREFIX
        };
        let name_pattern = Regex::new(pattern).map_err(|e| StackError::ConfigError {
            message: format!("volume name pattern: {}", e),
        })?;

        Ok(Self {
            driver: config.driver().to_string(),
            voluri: build_voluri(config.nodes(), config.base_path()),
            replicate: config.replicate().to_string(),
            read_only: config.read_only().to_string(),
            name_pattern,
        })
    }

    /// Names are matched from their first character; unless strict names
    /// are enabled a valid prefix is enough.
    pub fn is_valid_volume(&self, name: &str) -> bool {
        self.name_pattern.is_match(name)
    }

    /// `None` when the configuration is neither empty nor a mapping.
    pub fn convert_volume(&self, config: &Value) -> Option<Value> {
        let mut volume = match config {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping.clone(),
            _ => return None,
        };

        volume.insert("driver".into(), Value::String(self.driver.clone()));

        let mut driver_opts = match volume.get("driver_opts") {
            Some(Value::Mapping(opts)) => opts.clone(),
            _ => Mapping::new(),
        };
        driver_opts.insert("voluri".into(), Value::String(self.voluri.clone()));
        driver_opts.insert("replicate".into(), Value::String(self.replicate.clone()));
        driver_opts.insert("read-only".into(), Value::String(self.read_only.clone()));
        volume.insert("driver_opts".into(), Value::Mapping(driver_opts));

        Some(Value::Mapping(volume))
    }

    /// Convert every eligible volume in place and return their names.
    pub fn apply(&self, document: &mut StackDocument) -> Result<Vec<String>> {
        let volumes = match document.get(VOLUMES_KEY) {
            Some(Value::Mapping(volumes)) => volumes.clone(),
            Some(_) => {
                tracing::debug!("volumes section is not a mapping, nothing to convert");
                return Ok(Vec::new());
            }
            None => return Ok(Vec::new()),
        };

        let mut updated = volumes.clone();
        let mut converted = Vec::new();

        for (key, config) in &volumes {
            let Some(name) = key.as_str() else {
                continue;
            };
            if !self.is_valid_volume(name) {
                tracing::debug!("Skipping volume with invalid name '{}'", name);
                continue;
            }

            match self.convert_volume(config) {
                Some(volume) => {
                    tracing::info!(
                        "Converting volume '{}' to use GlusterFS with voluri '{}'",
                        name,
                        self.voluri
                    );
                    updated.insert(key.clone(), volume);
                    converted.push(name.to_string());
                }
                None => tracing::warn!(
                    "Volume '{}' is not configured with a mapping, leaving it unchanged",
                    name
                ),
            }
        }

        if converted.is_empty() {
            return Ok(converted);
        }

        let section = document
            .section(VOLUMES_KEY)
            .ok_or_else(|| StackError::unsupported("volumes section not found in file text"))?;
        let rewritten = rewrite_section(section, &volumes, &updated, &converted);
        document.replace_section(rewritten, Value::Mapping(updated))?;

        Ok(converted)
    }
}

fn rewrite_section(
    section: &Block,
    original: &Mapping,
    updated: &Mapping,
    converted: &[String],
) -> Block {
    if !section.has_inline_value() {
        if let Some(body) = rewrite_entries(section.body(), original, updated, converted) {
            return section.with_content(section.head().to_string(), body);
        }
        tracing::debug!("volumes section layout not recognized, emitting it in block style");
    }

    let indent = section.indent();
    let mut body = Vec::new();
    emit::emit_mapping_entries(updated, indent + emit::MAPPING_INDENT, &mut body);
    section.with_content(format!("{}{}:", " ".repeat(indent), section.raw_key()), body)
}

/// Rewrite only the converted entries; everything else keeps its text.
fn rewrite_entries(
    body: &[String],
    original: &Mapping,
    updated: &Mapping,
    converted: &[String],
) -> Option<Vec<String>> {
    let indent = content_indent(body)?;
    let split = split_blocks(body, indent).ok()?;
    if !keys_match(&split.blocks, updated) {
        return None;
    }

    let mut out = Vec::new();
    for (entry, (key, value)) in split.blocks.iter().zip(updated.iter()) {
        let was_converted = entry
            .key_str()
            .is_some_and(|name| converted.iter().any(|c| c == name));

        match value {
            Value::Mapping(config) if was_converted => {
                let lines = match original.get(key) {
                    Some(Value::Mapping(before)) => rewrite_block(entry, before, config),
                    _ => None,
                };
                out.extend(lines.unwrap_or_else(|| emit_whole(entry, config, indent)));
            }
            _ => out.extend(entry.lines().cloned()),
        }
    }
    out.extend(split.trailing);

    Some(out)
}

/// Re-emit a block-style mapping entry line by line: values that did not
/// change keep their text, comments included, and new keys are appended.
/// `None` when the body layout is not recognized.
fn rewrite_block(entry: &Block, before: &Mapping, after: &Mapping) -> Option<Vec<String>> {
    if entry.has_inline_value() {
        return None;
    }
    let indent = content_indent(entry.body())?;
    let split = split_blocks(entry.body(), indent).ok()?;
    if !keys_match(&split.blocks, before) {
        return None;
    }

    let mut out = entry.lead().to_vec();
    out.push(entry.head().to_string());
    for child in &split.blocks {
        let old = before.get(child.key())?;
        let new = after.get(child.key())?;
        out.extend(rewrite_value(child, old, new, indent));
    }
    for (key, value) in after.iter().filter(|(key, _)| !before.contains_key(*key)) {
        emit::emit_entry(&emit::inline(key, false), value, indent, &mut out);
    }
    out.extend(split.trailing);

    Some(out)
}

fn rewrite_value(entry: &Block, old: &Value, new: &Value, indent: usize) -> Vec<String> {
    if old == new {
        return entry.lines().cloned().collect();
    }
    if let (Value::Mapping(before), Value::Mapping(after)) = (old, new) {
        if let Some(lines) = rewrite_block(entry, before, after) {
            return lines;
        }
    }

    let mut out = entry.lead().to_vec();
    let collection = match new {
        Value::Mapping(mapping) => !mapping.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        _ => false,
    };
    if collection {
        emit::emit_entry(entry.raw_key(), new, indent, &mut out);
    } else {
        out.push(entry.head_with_value(&emit::inline(new, false)));
    }
    out
}

fn emit_whole(entry: &Block, config: &Mapping, indent: usize) -> Vec<String> {
    let mut out = entry.lead().to_vec();
    if entry.has_inline_value() {
        out.push(format!("{}{}:", " ".repeat(indent), entry.raw_key()));
    } else {
        out.push(entry.head().to_string());
    }
    emit::emit_mapping_entries(config, indent + emit::MAPPING_INDENT, &mut out);
    out
}
