//! Retrieval benchmarks: keyword `retrieve()` and spreading activation at
//! two graph sizes.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{Map, Value};

use engram_core::config::RetrievalConfig;
use engram_core::{Edge, EdgeType, LabelSet, MemoryState, Node};
use engram_graph::Graph;
use engram_retrieval::{retrieve, RetrieveParams};
use engram_storage::StorageEngine;

fn make_node(i: usize) -> Node {
    let mut properties = Map::new();
    properties.insert("title".to_string(), Value::from(format!("Memory {i}")));
    properties.insert(
        "content".to_string(),
        Value::from(format!("benchmark content number {i} about authentication flows")),
    );
    properties.insert("summary".to_string(), Value::from(format!("memory {i}")));
    Node {
        id: format!("mem-{i}"),
        labels: LabelSet::from(["Episode".to_string()]),
        properties,
        memory: MemoryState::new(chrono::Utc::now(), 0.01),
    }
}

fn build_graph(n: usize) -> Graph {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let graph = Graph::new(storage);
    for i in 0..n {
        graph.add_node_raw(make_node(i)).unwrap();
        if i > 0 {
            graph
                .add_edge(Edge::new(format!("mem-{}", i - 1), format!("mem-{i}"), EdgeType::References, 0.6))
                .unwrap();
        }
    }
    graph
}

fn bench_retrieve_100(c: &mut Criterion) {
    let graph = build_graph(100);
    let config = RetrievalConfig::default();
    let mut params = RetrieveParams::from_config(&config);
    params.query = Some("authentication".to_string());
    params.reinforce = false;

    c.bench_function("retrieve_keyword_100", |b| {
        b.iter(|| retrieve(&graph, None, &params, &config).unwrap());
    });
}

fn bench_retrieve_10k(c: &mut Criterion) {
    let graph = build_graph(10_000);
    let config = RetrievalConfig::default();
    let mut params = RetrieveParams::from_config(&config);
    params.query = Some("authentication".to_string());
    params.reinforce = false;

    c.bench_function("retrieve_keyword_10k", |b| {
        b.iter(|| retrieve(&graph, None, &params, &config).unwrap());
    });
}

fn bench_spreading_activation_1k(c: &mut Criterion) {
    let graph = build_graph(1_000);
    let seeds = vec!["mem-0".to_string()];

    c.bench_function("spreading_activation_1k_depth2", |b| {
        b.iter(|| engram_retrieval::activation::spreading_activation(&graph, &seeds, 2, 0.5).unwrap());
    });
}

criterion_group!(benches, bench_retrieve_100, bench_retrieve_10k, bench_spreading_activation_1k);
criterion_main!(benches);
