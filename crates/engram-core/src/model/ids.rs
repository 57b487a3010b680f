use super::label::LabelSet;

/// Deterministic node ID from `(title, labels)`: first 8 hex chars of
/// `md5(title | sorted_labels_joined_by_pipe)` (spec §3 "Node.id").
///
/// Re-inserting the same `(title, labels)` always yields the same ID, which
/// is what makes `add_memory` an upsert rather than an insert (spec §9
/// "Determinism").
pub fn node_id(title: &str, labels: &LabelSet) -> String {
    let joined_labels = labels.iter().cloned().collect::<Vec<_>>().join("|");
    let id_source = format!("{title}|{joined_labels}");
    let digest = md5::compute(id_source.as_bytes());
    hex_prefix(&digest.0, 8)
}

/// Deterministic code-node ID: first 16 hex chars of
/// `md5(file_path : qualified_name | label)` (spec §3 "Node.id", code
/// variant — the `file_path` component is what lets same-named symbols in
/// different files coexist).
pub fn code_node_id(file_path: &str, qualified_name: &str, label: &str) -> String {
    let id_source = format!("{file_path}:{qualified_name}|{label}");
    let digest = md5::compute(id_source.as_bytes());
    hex_prefix(&digest.0, 16)
}

fn hex_prefix(bytes: &[u8], hex_chars: usize) -> String {
    let mut out = String::with_capacity(hex_chars);
    for byte in bytes {
        if out.len() >= hex_chars {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(hex_chars);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        let labels: LabelSet = ["Decision", "ADR"].into_iter().map(String::from).collect();
        let a = node_id("ADR-001: Use Postgres", &labels);
        let b = node_id("ADR-001: Use Postgres", &labels);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn label_order_does_not_matter() {
        let labels_a: LabelSet = ["Decision", "ADR"].into_iter().map(String::from).collect();
        let labels_b: LabelSet = ["ADR", "Decision"].into_iter().map(String::from).collect();
        assert_eq!(node_id("X", &labels_a), node_id("X", &labels_b));
    }

    #[test]
    fn code_ids_include_file_path() {
        let a = code_node_id("a.py", "Foo.bar", "Function");
        let b = code_node_id("b.py", "Foo.bar", "Function");
        assert_ne!(a, b);
        assert_eq!(a.len(), 16);
    }
}
