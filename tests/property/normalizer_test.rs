// tests/property/normalizer_test.rs

//! Property-based tests for policy list normalization

use proptest::prelude::*;
use userpass::userpass::{PolicyInput, PolicyList};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_normalization_is_idempotent(raw in "[a-zA-Z0-9 ,_-]{0,80}") {
        let once = PolicyList::parse(&raw);
        let twice = PolicyList::parse(&once.to_canonical_string());
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(PolicyList::from_names(once.names()), once);
    }

    #[test]
    fn test_normalized_names_are_clean_and_unique(raw in "[a-zA-Z0-9 ,_-]{0,80}") {
        let list = PolicyList::parse(&raw);
        let names = list.names();
        for name in &names {
            prop_assert!(!name.is_empty());
            prop_assert_eq!(name.trim(), *name);
            prop_assert!(!name.contains(','));
            prop_assert_eq!(name.to_lowercase(), *name);
        }
        let mut deduped = names.clone();
        deduped.sort_unstable();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), names.len());
    }

    #[test]
    fn test_first_seen_order_is_kept(
        names in prop::collection::vec("[a-z]{1,6}", 0..20)
    ) {
        prop_assume!(!names.iter().any(|n| n == "root"));
        let list = PolicyList::from_names(&names);

        let mut expected: Vec<&str> = Vec::new();
        for name in &names {
            if !expected.contains(&name.as_str()) {
                expected.push(name);
            }
        }
        prop_assert_eq!(list.names(), expected);
    }

    #[test]
    fn test_comma_string_and_list_agree(
        names in prop::collection::vec("[a-z]{0,6}", 0..20)
    ) {
        let from_string = PolicyList::parse(&names.join(","));
        let from_list = PolicyList::from_names(&names);
        prop_assert_eq!(from_string, from_list);
    }

    #[test]
    fn test_list_canonical_form_round_trips(
        names in prop::collection::vec("[a-zA-Z ,]{0,8}", 0..12)
    ) {
        let list = PolicyInput::List(names.clone()).normalize();
        let reparsed = PolicyList::parse(&list.to_canonical_string());
        prop_assert_eq!(&reparsed, &list);
        prop_assert_eq!(PolicyList::parse(&names.join(",")), list);
    }

    #[test]
    fn test_root_absorbs_everything(
        before in prop::collection::vec("[a-z]{1,6}", 0..8),
        after in prop::collection::vec("[a-z]{1,6}", 0..8),
    ) {
        let mut names = before.clone();
        names.push(" ROOT ".to_string());
        names.extend(after);
        let list = PolicyList::from_names(&names);
        prop_assert_eq!(list.names(), vec!["root"]);
    }
}
