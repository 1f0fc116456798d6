//! Property-based tests for reordering, annotation and conversion.

use proptest::prelude::*;

use gluster_stacks::core::annotate::{build_comment_block, scan_dynamic_values, CANONICAL_ORDER};
use gluster_stacks::core::document::move_keys_to_front;
use gluster_stacks::core::volumes::VolumeConverter;
use gluster_stacks::{StackConfig, StackDocument};

/// Extra top-level keys that never collide with the canonical ones.
fn extra_key() -> impl Strategy<Value = String> {
    "x-[a-z]{1,8}"
}

fn present_keys() -> impl Strategy<Value = Vec<String>> {
    (
        prop::collection::vec(any::<bool>(), 4),
        prop::collection::btree_set(extra_key(), 0..5),
    )
        .prop_flat_map(|(mask, extras)| {
            let mut keys: Vec<String> = CANONICAL_ORDER
                .iter()
                .zip(mask)
                .filter(|(_, keep)| *keep)
                .map(|(key, _)| key.to_string())
                .collect();
            keys.extend(extras);
            Just(keys).prop_shuffle()
        })
}

proptest! {
    #[test]
    fn reorder_puts_canonical_keys_first(keys in present_keys()) {
        let mut reordered = keys.clone();
        move_keys_to_front(&mut reordered, &CANONICAL_ORDER, |k| Some(k.as_str()));

        let expected_front: Vec<String> = CANONICAL_ORDER
            .iter()
            .filter(|key| keys.iter().any(|k| k == *key))
            .map(|key| key.to_string())
            .collect();
        let expected_rest: Vec<String> = keys
            .iter()
            .filter(|k| !CANONICAL_ORDER.contains(&k.as_str()))
            .cloned()
            .collect();

        prop_assert_eq!(&reordered[..expected_front.len()], &expected_front[..]);
        prop_assert_eq!(&reordered[expected_front.len()..], &expected_rest[..]);
    }

    #[test]
    fn document_reorder_never_invents_keys(keys in present_keys()) {
        let raw: String = keys.iter().map(|k| format!("{}:\n  a: 1\n", k)).collect();
        let mut document = StackDocument::parse(&raw).unwrap();
        document.reorder(&CANONICAL_ORDER);

        let rendered = document.render();
        let reparsed = StackDocument::parse(&rendered).unwrap();
        prop_assert_eq!(reparsed.root().len(), keys.len());
        prop_assert_eq!(rendered.len(), raw.len());
    }

    #[test]
    fn comment_block_is_sorted_and_unique(names in prop::collection::vec("[A-Z][A-Z0-9_]{0,6}", 0..6)) {
        let raw: String = names.iter().map(|n| format!("k: ${{{}}}\n", n)).collect();
        let block = build_comment_block(&scan_dynamic_values(&raw));

        let listed: Vec<&String> = block.iter().skip(1).collect();
        let mut sorted = listed.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(listed, sorted);
    }

    #[test]
    fn converted_volumes_keep_unrelated_options(
        name in "[a-z][a-z0-9_-]{0,10}",
        option in "[a-z]{1,6}",
        value in "[a-z]{1,6}",
    ) {
        prop_assume!(!["voluri", "replicate", "read-only", "true", "false", "null"].contains(&option.as_str()));
        prop_assume!(!["true", "false", "null"].contains(&name.as_str()));
        prop_assume!(!["true", "false", "null"].contains(&value.as_str()));

        let raw = format!(
            "volumes:\n  {}:\n    driver: local\n    driver_opts:\n      {}: {}\n",
            name, option, value
        );
        let mut document = StackDocument::parse(&raw).unwrap();
        let converter = VolumeConverter::new(&StackConfig::default()).unwrap();
        converter.apply(&mut document).unwrap();

        let reparsed = StackDocument::parse(&document.render()).unwrap();
        let volumes = reparsed.get("volumes").unwrap();
        let opts = &volumes[name.as_str()]["driver_opts"];
        prop_assert_eq!(opts[option.as_str()].as_str(), Some(value.as_str()));
        prop_assert_eq!(opts["replicate"].as_str(), Some("3"));
    }
}
