//! Builds the text an [`engram_core::EmbeddingProvider`] actually sees from a
//! node. Every provider — local or remote — embeds the same string, so the
//! vector store stays comparable across provider swaps (modulo the
//! model-identity guard in [`crate::model_guard`]).

use engram_core::Node;

/// `title + " " + content[:content_chars] + " " + labels` (spec §4.8), with a
/// fallback to `summary` when the node carries no `content` property.
pub fn node_embedding_text(node: &Node, content_chars: usize) -> String {
    let title = node.title().unwrap_or_default();
    let body = node
        .content()
        .or_else(|| node.summary())
        .unwrap_or_default();
    let truncated = truncate_chars(&body, content_chars);
    let labels = node
        .labels
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    format!("{title} {truncated} {labels}").trim().to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
