use std::collections::BTreeSet;

/// A node's label is a free-form string tag. Labels are not a closed enum —
/// the `<Scope>Domain` convention (e.g. `AuthDomain`) mints new label
/// strings at ingestion time that the engine never enumerates up front.
pub type Label = String;

/// An ordered, deduplicated set of labels. `BTreeSet` gives deterministic
/// iteration order, which matters for anything that serializes labels
/// (export snapshots, ID-adjacent debug output).
pub type LabelSet = BTreeSet<Label>;

/// Decay rate selected by the first matching label, in priority order.
/// Exclusive, first match wins (spec §3 "Decay-rate by label").
pub fn decay_rate_for_labels(labels: &LabelSet) -> f64 {
    const RULES: &[(&str, f64)] = &[
        ("Decision", 0.001),
        ("Pattern", 0.005),
        ("Concept", 0.003),
        ("Episode", 0.01),
        ("Person", 0.0001),
    ];
    for (label, rate) in RULES {
        if labels.contains(*label) {
            return *rate;
        }
    }
    0.02
}

/// Is this node protected from archival regardless of strength?
/// `Person`/`Domain`/`Decision` are protected (spec §3 Lifecycle).
pub fn is_archive_protected(labels: &LabelSet) -> bool {
    labels.contains("Person") || labels.contains("Domain") || labels.contains("Decision")
}

/// Compact-result `type` field: the first label matching a fixed priority
/// list, else `"Memory"` (spec §4.5 step 5).
pub fn compact_type(labels: &LabelSet) -> &'static str {
    const PRIORITY: &[&str] = &[
        "ADR",
        "Decision",
        "Pattern",
        "Concept",
        "Rule",
        "Episode",
        "Commit",
        "BugFix",
        "Experience",
        "Person",
    ];
    for candidate in PRIORITY {
        if labels.contains(*candidate) {
            return candidate;
        }
    }
    "Memory"
}
