use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use engram_core::config::DecayConfig;
use engram_core::{MemoryState, Node};
use engram_decay::DecayEngine;

fn make_nodes(count: usize) -> Vec<Node> {
    let now = Utc::now();
    (0..count)
        .map(|i| {
            let mut labels = BTreeSet::new();
            labels.insert("Episode".to_string());
            Node {
                id: format!("mem-{i:05}"),
                labels,
                properties: serde_json::Map::new(),
                memory: MemoryState {
                    strength: 1.0,
                    access_count: (i % 10) as u64,
                    last_accessed: Some(now - Duration::days((i % 90) as i64)),
                    created_at: now,
                    decay_rate: 0.01,
                },
            }
        })
        .collect()
}

fn decay_benchmarks(c: &mut Criterion) {
    let engine = DecayEngine::new(DecayConfig::default());
    let now = Utc::now();

    let memories_1k = make_nodes(1_000);
    c.bench_function("decay_1k_nodes", |b| b.iter(|| engine.process_batch(&memories_1k, now)));

    let memories_10k = make_nodes(10_000);
    c.bench_function("decay_10k_nodes", |b| b.iter(|| engine.process_batch(&memories_10k, now)));
}

criterion_group!(benches, decay_benchmarks);
criterion_main!(benches);
