use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::label::LabelSet;
use super::memory::MemoryState;

/// A unit of knowledge (spec §3 "Node").
///
/// `properties` is a free-form key/value bag; a handful of reserved keys
/// (`title`, `author`, `content`, `summary`, ...) are interpreted by the
/// engine, but arbitrary extra properties ride along untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub labels: LabelSet,
    pub properties: Map<String, Value>,
    pub memory: MemoryState,
}

impl Node {
    pub fn title(&self) -> Option<&str> {
        self.properties.get("title").and_then(Value::as_str)
    }

    pub fn content(&self) -> Option<&str> {
        self.properties.get("content").and_then(Value::as_str)
    }

    pub fn summary(&self) -> Option<&str> {
        self.properties.get("summary").and_then(Value::as_str)
    }

    pub fn author(&self) -> Option<&str> {
        self.properties.get("author").and_then(Value::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Whether this node carries the `WeakMemory` label (decayed below the
    /// archive-protection floor but not yet archived).
    pub fn is_weak(&self) -> bool {
        self.has_label("WeakMemory")
    }

    pub fn is_archived(&self) -> bool {
        self.has_label("Archived")
    }
}

/// `summary` is derived from `content`: truncate/normalize to <=500 chars
/// (spec §3 "properties"). Whitespace is collapsed so the summary reads as
/// one paragraph regardless of the source's line breaks.
pub fn derive_summary(content: &str) -> String {
    const MAX_LEN: usize = 500;
    let normalized: String = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= MAX_LEN {
        return normalized;
    }
    let truncated: String = normalized.chars().take(MAX_LEN).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_collapses_whitespace_and_truncates() {
        let content = "a\n\nb   c".to_string() + &" d".repeat(400);
        let summary = derive_summary(&content);
        assert!(summary.starts_with("a b c"));
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= 503);
    }

    #[test]
    fn short_content_is_untouched_besides_whitespace() {
        assert_eq!(derive_summary("hello   world"), "hello world");
    }
}
