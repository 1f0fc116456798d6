use crate::core::document::StackDocument;
use crate::domain::model::DynamicValues;
use regex::Regex;
use std::sync::LazyLock;

pub const SUMMARY_HEADER: &str = "# Dynamic Values in this file:";
pub const NONE_FOUND: &str = "# None found";
pub const CANONICAL_ORDER: [&str; 4] = ["version", "services", "volumes", "networks"];

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[A-Z0-9_:-]+\}").expect("placeholder pattern is valid"));

const SECRETS_MARKER: &str = "secrets:";
const CONFIGS_MARKER: &str = "configs:";
const VOLUME_PATH: &str = "${VOLUME_PATH}";

/// Comment lines at the very top of the file, up to the first line that is
/// not a comment.
pub fn extract_leading_comments(raw: &str) -> Vec<String> {
    raw.lines()
        .take_while(|line| line.trim().starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn scan_dynamic_values(raw: &str) -> DynamicValues {
    let mut values: DynamicValues = ENV_PLACEHOLDER
        .find_iter(raw)
        .map(|found| found.as_str())
        .collect();

    if raw.contains(SECRETS_MARKER) {
        values.insert("secrets");
    }
    if raw.contains(CONFIGS_MARKER) {
        values.insert("configs");
    }
    if raw.contains(VOLUME_PATH) {
        values.insert(VOLUME_PATH);
    }

    values
}

pub fn build_comment_block(values: &DynamicValues) -> Vec<String> {
    let mut block = vec![SUMMARY_HEADER.to_string()];
    if values.is_empty() {
        block.push(NONE_FOUND.to_string());
    } else {
        block.extend(values.iter().map(|value| format!("# - {}", value)));
    }
    block
}

/// Original leading comments followed by a fresh summary block. A summary
/// written by an earlier run is dropped first.
pub fn assemble_start_comment(existing: &[String], values: &DynamicValues) -> Vec<String> {
    let mut lines = strip_previous_summary(existing);
    lines.extend(build_comment_block(values));
    lines
}

fn strip_previous_summary(lines: &[String]) -> Vec<String> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut in_summary = false;

    for line in lines {
        let trimmed = line.trim();
        if trimmed == SUMMARY_HEADER {
            in_summary = true;
            continue;
        }
        if in_summary && (trimmed.starts_with("# - ") || trimmed == NONE_FOUND) {
            continue;
        }
        in_summary = false;
        kept.push(line.clone());
    }

    kept
}

/// Attach the summary of `original` (the untransformed file text) as the
/// document's leading comment.
pub fn annotate(document: &mut StackDocument, original: &str) -> DynamicValues {
    let existing = extract_leading_comments(original);
    let values = scan_dynamic_values(original);
    document.set_header(assemble_start_comment(&existing, &values));
    values
}

pub fn reorder(document: &mut StackDocument) {
    document.reorder(&CANONICAL_ORDER);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_comments_stop_at_first_other_line() {
        let raw = "# Stack: api\n  # indented\n\n# not leading\nversion: '3'\n";
        assert_eq!(
            extract_leading_comments(raw),
            vec!["# Stack: api".to_string(), "  # indented".to_string()]
        );
        assert!(extract_leading_comments("version: '3'\n# late\n").is_empty());
    }

    #[test]
    fn test_scan_finds_placeholders_and_secrets() {
        let raw = "services:\n  app:\n    image: ${REGISTRY}/app:${TAG:-LATEST}\n    secrets:\n      - db_pass\n    environment:\n      USER: ${FOO_BAR}\n      LOWER: ${lower}\n      AGAIN: ${FOO_BAR}\n";
        let values = scan_dynamic_values(raw);
        let listed: Vec<_> = values.iter().collect();
        assert_eq!(
            listed,
            vec!["${FOO_BAR}", "${REGISTRY}", "${TAG:-LATEST}", "secrets"]
        );
        assert!(!values.contains("configs"));
    }

    #[test]
    fn test_comment_block_lists_sorted_values() {
        let values: DynamicValues = ["secrets", "${FOO_BAR}"].into_iter().collect();
        assert_eq!(
            build_comment_block(&values),
            vec![
                "# Dynamic Values in this file:".to_string(),
                "# - ${FOO_BAR}".to_string(),
                "# - secrets".to_string(),
            ]
        );
    }

    #[test]
    fn test_comment_block_without_values() {
        assert_eq!(
            build_comment_block(&DynamicValues::default()),
            vec![SUMMARY_HEADER.to_string(), NONE_FOUND.to_string()]
        );
    }

    #[test]
    fn test_volume_path_and_configs_are_reported() {
        let raw = "volumes:\n  data:\n    driver_opts:\n      device: ${VOLUME_PATH}/data\nconfigs:\n  app_conf:\n    file: ./app.conf\n";
        let values = scan_dynamic_values(raw);
        assert!(values.contains("${VOLUME_PATH}"));
        assert!(values.contains("configs"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_previous_summary_is_replaced() {
        let existing = vec![
            "# Stack: api".to_string(),
            SUMMARY_HEADER.to_string(),
            "# - ${OLD}".to_string(),
            "# trailing note".to_string(),
        ];
        let values: DynamicValues = ["${NEW}"].into_iter().collect();
        assert_eq!(
            assemble_start_comment(&existing, &values),
            vec![
                "# Stack: api".to_string(),
                "# trailing note".to_string(),
                SUMMARY_HEADER.to_string(),
                "# - ${NEW}".to_string(),
            ]
        );
    }

    #[test]
    fn test_annotate_and_reorder_document() {
        let raw = "# api stack\nnetworks:\n  default: {}\nx-meta: ${OWNER}\nservices:\n  api:\n    image: api\nversion: '3.8'\n";
        let mut document = StackDocument::parse(raw).unwrap();
        let values = annotate(&mut document, raw);
        reorder(&mut document);

        assert!(values.contains("${OWNER}"));
        assert_eq!(
            document.render(),
            "# api stack\n# Dynamic Values in this file:\n# - ${OWNER}\nversion: '3.8'\nservices:\n  api:\n    image: api\nnetworks:\n  default: {}\nx-meta: ${OWNER}\n"
        );
    }
}
