//! Property-based tests using proptest.
//!
//! These tests verify invariants of the output index space and of archive
//! path validation using randomly generated inputs.

mod common;

use std::collections::BTreeSet;

use common::{ToyEngine, build_archive, creator, decode};
use proptest::prelude::*;
use sevenlink::update::IndexMapping;
use sevenlink::{ArchivePath, InputIndex, OutputArchive, UpdateMode};

/// Strategy for generating valid archive path strings.
///
/// - 1-4 path components separated by '/'
/// - Each component is 1-10 alphanumeric characters with optional underscores/dots/dashes
/// - Excludes "." and ".." segments
fn valid_path_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-Z0-9][a-zA-Z0-9_.-]{0,9}", 1..4)
        .prop_map(|parts| parts.join("/"))
        .prop_filter("must not contain dot segments", |s| {
            !s.split('/').any(|seg| seg == "." || seg == "..")
        })
}

/// An existing-item count together with a subset of its indices.
fn deletion_strategy() -> impl Strategy<Value = (u32, BTreeSet<u32>)> {
    (0u32..40)
        .prop_flat_map(|count| (Just(count), proptest::collection::vec(any::<bool>(), count as usize)))
        .prop_map(|(count, flags)| {
            let deleted = flags
                .iter()
                .enumerate()
                .filter(|(_, deleted)| **deleted)
                .map(|(index, _)| index as u32)
                .collect();
            (count, deleted)
        })
}

proptest! {
    /// Surviving source items keep their relative order, deleted ones never
    /// appear, and new items follow in insertion order.
    #[test]
    fn mapping_is_ordered_merge(
        (existing, deleted) in deletion_strategy(),
        new_count in 0u32..20,
    ) {
        let mapping = IndexMapping::build(existing, &deleted, new_count);
        let count = existing - deleted.len() as u32 + new_count;
        let resolved: Vec<InputIndex> = (0..count).map(|i| mapping.get(i)).collect();

        let expected_existing: Vec<u32> = (0..existing).filter(|i| !deleted.contains(i)).collect();
        let kept = expected_existing.len();
        let existing_part: Vec<u32> = resolved[..kept].iter().filter_map(|i| i.existing()).collect();
        prop_assert_eq!(existing_part, expected_existing);

        let new_part: Vec<InputIndex> = resolved[kept..].to_vec();
        let expected_new: Vec<InputIndex> = (0..new_count).map(InputIndex::New).collect();
        prop_assert_eq!(new_part, expected_new);

        prop_assert_eq!(mapping.is_identity(), deleted.is_empty());
    }

    /// Building twice from the same state gives the same table.
    #[test]
    fn mapping_is_idempotent(
        (existing, deleted) in deletion_strategy(),
        new_count in 0u32..20,
    ) {
        prop_assert_eq!(
            IndexMapping::build(existing, &deleted, new_count),
            IndexMapping::build(existing, &deleted, new_count)
        );
    }

    /// Resolving from the delete set agrees with the materialized table.
    #[test]
    fn resolve_matches_table(
        (existing, deleted) in deletion_strategy(),
        new_count in 0u32..20,
    ) {
        let mapping = IndexMapping::build(existing, &deleted, new_count);
        let count = existing - deleted.len() as u32 + new_count;
        for i in 0..count {
            prop_assert_eq!(IndexMapping::resolve(existing, &deleted, i), mapping.get(i));
        }
    }

    /// The packed encoding is a bijection for a fixed existing count.
    #[test]
    fn packed_index_round_trip(packed in 0u32..10_000, existing in 0u32..5_000) {
        let index = InputIndex::from_packed(packed, existing);
        prop_assert_eq!(index.to_packed(existing), packed);
        prop_assert_eq!(index.is_new(), packed >= existing);
    }

    /// Valid paths should always parse and keep their text.
    #[test]
    fn valid_paths_parse_successfully(path in valid_path_strategy()) {
        let parsed = ArchivePath::new(&path);
        prop_assert!(parsed.is_ok(), "Valid path '{}' failed to parse: {:?}", path, parsed);
        let parsed = parsed.unwrap();
        prop_assert_eq!(parsed.as_str(), path.as_str());
        prop_assert_eq!(parsed.depth(), path.split('/').count());
    }

    /// Any path with a parent segment is rejected.
    #[test]
    fn parent_segments_rejected(
        prefix in valid_path_strategy(),
        suffix in valid_path_strategy(),
    ) {
        let path = format!("{}/../{}", prefix, suffix);
        prop_assert!(ArchivePath::new(&path).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// End to end: the written archive holds the kept source items in order
    /// followed by the new items.
    #[test]
    fn compress_keeps_order(
        (existing, deleted) in deletion_strategy(),
        new_count in 0u32..6,
    ) {
        let engine = ToyEngine::new();
        let names: Vec<String> = (0..existing).map(|i| format!("old{}", i)).collect();
        let entries: Vec<(&str, &[u8])> =
            names.iter().map(|n| (n.as_str(), n.as_bytes())).collect();
        let source = build_archive(&engine, &entries);

        let creator = creator(&engine, UpdateMode::Append);
        let mut output = OutputArchive::with_buffer(&creator, &source).unwrap();
        for &index in &deleted {
            output.delete_item(index).unwrap();
        }
        for i in 0..new_count {
            output.add_buffer(vec![i as u8], &format!("new{}", i)).unwrap();
        }

        let mut buffer = Vec::new();
        output.compress_to_buffer(&mut buffer).unwrap();
        let archive = decode(&buffer).unwrap();

        let expected: Vec<String> = (0..existing)
            .filter(|i| !deleted.contains(i))
            .map(|i| format!("old{}", i))
            .chain((0..new_count).map(|i| format!("new{}", i)))
            .collect();
        let actual: Vec<String> = archive.names().iter().map(|s| s.to_string()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(engine.log().copied.len(), existing as usize - deleted.len());
    }
}
