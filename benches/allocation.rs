//! Benchmarks for caller selection and end-to-end assignment.
//!
//! Selection runs on every ingest and requeue, so it should stay well under
//! a microsecond for realistic team sizes.

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch::allocation::{select_caller, AllocationConfig};
use dispatch::disposition::TransitionGraph;
use dispatch::engine::DispositionEngine;
use dispatch::order::{CustomerContact, NewOrder, OrderKind};
use dispatch::roster::{Caller, Roster};
use dispatch::store::{InMemoryStore, QueueStats};
use std::sync::Arc;

fn create_stats(count: usize) -> Vec<QueueStats> {
    let now = Utc::now();
    (0..count)
        .map(|i| QueueStats {
            caller_id: format!("caller-{:03}", i),
            size: (i * 7) % 13,
            last_assigned_at: if i % 5 == 0 {
                None
            } else {
                Some(now - Duration::seconds(i as i64))
            },
        })
        .collect()
}

fn create_order(id: usize) -> NewOrder {
    NewOrder {
        order_id: format!("ord-{}", id),
        source_id: "store-a".to_string(),
        kind: OrderKind::CashOnDelivery,
        customer: CustomerContact {
            name: "Bench Customer".to_string(),
            phone: "+910000000000".to_string(),
            address: None,
            postal_code: None,
        },
        line_items: vec![],
        total: 49_900,
        currency: Some("INR".to_string()),
        placed_at: None,
    }
}

fn bench_select_caller(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_caller");

    for count in [5, 25, 100] {
        let stats = create_stats(count);
        group.bench_with_input(BenchmarkId::new("callers", count), &stats, |b, stats| {
            b.iter(|| select_caller(black_box(stats), black_box(Some("caller-000"))))
        });
    }

    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("ingest");

    for count in [5, 25] {
        group.bench_function(BenchmarkId::new("callers", count), |b| {
            let roster = Arc::new(Roster::new());
            for i in 0..count {
                roster
                    .add_caller(Caller::new(format!("caller-{}", i), format!("Caller {}", i)))
                    .unwrap();
            }
            let engine = DispositionEngine::new(
                Arc::new(InMemoryStore::new()),
                roster,
                TransitionGraph::standard(),
                AllocationConfig::default(),
            );
            let mut next = 0;
            b.iter(|| {
                next += 1;
                runtime
                    .block_on(engine.ingest(create_order(next)))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select_caller, bench_ingest);
criterion_main!(benches);
