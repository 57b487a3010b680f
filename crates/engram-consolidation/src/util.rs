//! Small helpers shared across the sleep phases.

use engram_core::errors::EngramResult;
use engram_graph::Graph;

/// `true` if an edge exists in either direction between `a` and `b`,
/// regardless of type. Used by phases that connect otherwise-unlinked nodes
/// (`relate`, `consolidate`) to avoid laying a second edge over an existing
/// relationship of any kind.
pub(crate) fn edge_exists_either_direction(graph: &Graph, a: &str, b: &str) -> EngramResult<bool> {
    if graph.storage().outgoing_edges(a)?.iter().any(|e| e.to_id == b) {
        return Ok(true);
    }
    Ok(graph.storage().outgoing_edges(b)?.iter().any(|e| e.to_id == a))
}

/// Stable pseudo-random ordering key for an id: the first 8 bytes of
/// `md5(id)` as a big-endian integer. Used wherever the source samples
/// candidates at random (`relate`'s >500-candidate cap) — deterministic
/// so the same graph always produces the same sample, without pulling in a
/// `rand` dependency nobody else in the workspace needs.
pub(crate) fn stable_sample_key(id: &str) -> u64 {
    let digest = md5::compute(id.as_bytes()).0;
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}
