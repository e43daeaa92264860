//! Benchmarks for length-weighted node sampling and edge injection
//!
//! Run with: cargo bench -p hicbench-core

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hicbench_core::noise::inject_edges;
use hicbench_core::{ContactGraph, LengthIndex};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Build a chain graph whose contig lengths vary like a real assembly
fn generate_graph(nodes: usize) -> ContactGraph {
  let mut graph = ContactGraph::new();
  for i in 0..nodes {
    let length = 500 + ((i * 7919) % 50_000) as u64;
    graph.add_contig(&format!("ctg{i:07}"), length).unwrap();
  }
  for i in 1..nodes {
    graph
      .add_contact(&format!("ctg{:07}", i - 1), &format!("ctg{i:07}"), ((i % 13) + 1) as f64)
      .unwrap();
  }
  graph
}

fn bench_sample(c: &mut Criterion) {
  let mut group = c.benchmark_group("length_index_sample");

  for nodes in [1_000, 10_000, 100_000] {
    let graph = generate_graph(nodes);
    let index = LengthIndex::build(&graph);
    group.throughput(Throughput::Elements(1));
    group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
      let mut rng = StdRng::seed_from_u64(1);
      b.iter(|| black_box(index.sample(&graph, &mut rng).unwrap()))
    });
  }

  group.finish();
}

fn bench_inject(c: &mut Criterion) {
  let mut group = c.benchmark_group("inject_edges");
  let graph = generate_graph(10_000);
  let index = LengthIndex::build(&graph);

  for n_edges in [100u64, 1_000, 10_000] {
    group.throughput(Throughput::Elements(n_edges));
    group.bench_with_input(BenchmarkId::from_parameter(n_edges), &n_edges, |b, &n| {
      b.iter(|| {
        let mut rng = StdRng::seed_from_u64(7);
        black_box(inject_edges(&graph, &index, n, &mut rng).unwrap())
      })
    });
  }

  group.finish();
}

criterion_group!(benches, bench_sample, bench_inject);
criterion_main!(benches);
