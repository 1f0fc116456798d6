use crate::core::document::StackDocument;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A stack file as read from the source directory.
#[derive(Debug, Clone)]
pub struct StackFile {
    pub path: PathBuf,
    pub file_name: String,
    pub raw: String,
    pub document: StackDocument,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub source: PathBuf,
    pub file_name: String,
    pub content: String,
    pub converted_volumes: Vec<String>,
    pub dynamic_values: DynamicValues,
}

/// Placeholders and external references found in a file, sorted and
/// de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicValues(BTreeSet<String>);

impl DynamicValues {
    pub fn insert(&mut self, value: impl Into<String>) {
        self.0.insert(value.into());
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for DynamicValues {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub discovered: usize,
    pub written: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}
