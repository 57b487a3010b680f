//! Seed-set construction, spec §4.5 step 1 — the four cases hanging off
//! which of `query` / `query_embedding` / bare `since` were supplied.

use std::collections::HashMap;

use engram_core::config::RetrievalConfig;
use engram_core::errors::EngramResult;
use engram_graph::Graph;

use crate::activation::spreading_activation;
use crate::params::RetrieveParams;

/// A seed-set: node id → score, before filters/sort/reinforce are applied.
pub type Scores = HashMap<String, f64>;

/// Builds the seed set per spec §4.5 step 1.
///
/// - Temporal-only (`since` given, nothing else): every node with
///   `created_at >= since` scores `1.0`.
/// - `query_embedding` only: ANN top-`semantic_seed_count` seeds score
///   `similarity * 2`, then spreading activation from those seeds adds in
///   (`max`, not replace) every reached node's activation.
/// - Both `query` and `query_embedding`: FTS5 BM25 hits normalized to
///   `[0, 1]` by local max; a node that is both a semantic seed and a
///   keyword hit gets `+= 0.5 * normalized_bm25` on top of its embedding
///   score; a keyword-only hit gets a fresh `0.5 * normalized_bm25`.
/// - `query` only: FTS5 BM25 (falls back to LIKE internally, see
///   `engram-storage`), scores taken as returned.
pub fn build_seed_scores(
    graph: &Graph,
    vector_store: Option<&dyn engram_embeddings::vector::VectorStore>,
    params: &RetrieveParams,
    config: &RetrievalConfig,
) -> EngramResult<Scores> {
    let has_query = params.query.as_deref().is_some_and(|q| !q.trim().is_empty());
    let has_embedding = params.query_embedding.is_some();

    if !has_query && !has_embedding {
        if let Some(since) = &params.since {
            return temporal_seed_scores(graph, since);
        }
        return Ok(Scores::new());
    }

    if has_embedding && !has_query {
        return embedding_seed_scores(graph, vector_store, params, config);
    }

    if has_embedding && has_query {
        return fused_seed_scores(graph, vector_store, params, config);
    }

    keyword_seed_scores(graph, params, config)
}

fn temporal_seed_scores(graph: &Graph, since: &str) -> EngramResult<Scores> {
    let nodes = graph.storage().nodes_since(since)?;
    Ok(nodes.into_iter().map(|n| (n.id, 1.0)).collect())
}

fn embedding_seed_scores(
    graph: &Graph,
    vector_store: Option<&dyn engram_embeddings::vector::VectorStore>,
    params: &RetrieveParams,
    config: &RetrievalConfig,
) -> EngramResult<Scores> {
    let mut scores = Scores::new();
    let Some(store) = vector_store else { return Ok(scores) };
    let Some(embedding) = &params.query_embedding else { return Ok(scores) };

    let matches = store.query(embedding, config.semantic_seed_count)?;
    let seed_ids: Vec<String> = matches.iter().map(|m| m.node_id.clone()).collect();
    for m in &matches {
        scores.insert(m.node_id.clone(), m.similarity * 2.0);
    }

    let activation = spreading_activation(graph, &seed_ids, params.spread_depth, config.spreading_decay)?;
    for (id, level) in activation {
        let entry = scores.entry(id).or_insert(0.0);
        *entry += level;
    }

    Ok(scores)
}

fn keyword_seed_scores(graph: &Graph, params: &RetrieveParams, config: &RetrievalConfig) -> EngramResult<Scores> {
    let Some(query) = &params.query else { return Ok(Scores::new()) };
    let hits = graph.storage().fts_search(query, params.top_k.max(50), config.bm25_weights)?;
    Ok(hits.into_iter().map(|h| (h.node_id, h.score)).collect())
}

fn fused_seed_scores(
    graph: &Graph,
    vector_store: Option<&dyn engram_embeddings::vector::VectorStore>,
    params: &RetrieveParams,
    config: &RetrievalConfig,
) -> EngramResult<Scores> {
    let mut scores = embedding_seed_scores(graph, vector_store, params, config)?;

    let query = params.query.as_deref().unwrap_or_default();
    let hits = graph.storage().fts_search(query, params.top_k.max(50), config.bm25_weights)?;
    let max_bm25 = hits.iter().map(|h| h.score).fold(0.0_f64, f64::max);

    for hit in hits {
        let normalized = if max_bm25 > 0.0 { hit.score / max_bm25 } else { 0.0 };
        if let Some(existing) = scores.get_mut(&hit.node_id) {
            *existing += 0.5 * normalized;
        } else {
            scores.insert(hit.node_id, 0.5 * normalized);
        }
    }

    Ok(scores)
}
