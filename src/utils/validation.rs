use crate::utils::error::{Result, StackError};
use std::collections::HashSet;
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let display = path.to_string_lossy();
    if display.is_empty() {
        return Err(StackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if display.contains('\0') {
        return Err(StackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(StackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StackError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Node addresses end up inside `voluri`, where `,` separates nodes and `:`
/// separates a node from its path.
pub fn validate_node_addresses(field_name: &str, nodes: &[String]) -> Result<()> {
    if nodes.is_empty() {
        return Err(StackError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for node in nodes {
        validate_non_empty_string(field_name, node)?;

        if node.chars().any(|c| c.is_whitespace() || c == ',' || c == ':') {
            return Err(StackError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: node.clone(),
                reason: "Node address cannot contain whitespace, ',' or ':'".to_string(),
            });
        }

        if !seen.insert(node.as_str()) {
            return Err(StackError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: node.clone(),
                reason: "Duplicate node address".to_string(),
            });
        }
    }

    Ok(())
}
