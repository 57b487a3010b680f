use std::collections::BTreeSet;

use engram_core::{decay_rate_for_labels, is_archive_protected, node_id};
use proptest::prelude::*;

fn labelset(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

proptest! {
    /// Spec §8 invariant 1: the ID derived from `(title, labels)` is
    /// deterministic across runs.
    #[test]
    fn node_id_is_deterministic(title in ".*", labels in prop::collection::vec("[A-Za-z]{1,12}", 0..5)) {
        let set = labelset(&labels.iter().map(String::as_str).collect::<Vec<_>>());
        let a = node_id(&title, &set);
        let b = node_id(&title, &set);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn decay_rate_first_match_wins() {
    let decision_and_pattern = labelset(&["Pattern", "Decision"]);
    assert_eq!(decay_rate_for_labels(&decision_and_pattern), 0.001);

    let pattern_only = labelset(&["Pattern"]);
    assert_eq!(decay_rate_for_labels(&pattern_only), 0.005);

    let unmatched = labelset(&["Theme"]);
    assert_eq!(decay_rate_for_labels(&unmatched), 0.02);
}

#[test]
fn person_domain_decision_are_archive_protected() {
    assert!(is_archive_protected(&labelset(&["Person"])));
    assert!(is_archive_protected(&labelset(&["Domain"])));
    assert!(is_archive_protected(&labelset(&["Decision"])));
    assert!(!is_archive_protected(&labelset(&["Episode"])));
}
