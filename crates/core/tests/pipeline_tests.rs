//! End-to-end tests over the file formats exchanged with the pipeline
//!
//! Tests: truth table load/summary/projections, listing vs YAML comparison,
//! corruption round trip through disk, noisy replicate emission and
//! all-or-nothing replicate output.

use std::path::Path;

use hicbench_core::{
  ContactGraph, CorruptionParams, Error, NoiseInjector, NoiseParams, TruthTable, corrupt_seeded, crosstab,
  read_cluster_listing, read_truth, search_up,
};
use tempfile::TempDir;

const GRAPH: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="length" attr.type="int"/>
  <key id="d1" for="edge" attr.name="weight" attr.type="int"/>
  <graph edgedefault="undirected">
    <node id="ctg1"><data key="d0">1500</data></node>
    <node id="ctg2"><data key="d0">800</data></node>
    <node id="ctg3"><data key="d0">4200</data></node>
    <node id="ctg4"><data key="d0">300</data></node>
    <edge source="ctg1" target="ctg2"><data key="d1">40</data></edge>
    <edge source="ctg2" target="ctg3"><data key="d1">25</data></edge>
    <edge source="ctg3" target="ctg4"><data key="d1">12</data></edge>
  </graph>
</graphml>
"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, content).expect("Failed to write fixture");
  path
}

#[test]
fn test_summary_matches_assignments() {
  let table =
    TruthTable::from_yaml_str("o1: {A: 1.0}\no2: {A: 0.5, B: 0.5}\no3: {B: 1.0}\no4: {A: 0.2, B: 0.3, C: 0.5}\n")
      .unwrap();
  let summary = table.summary();
  assert_eq!(summary.object_count, table.len());
  let per_object: usize = table.assignments().values().map(|s| s.len()).sum();
  assert_eq!(summary.assignment_count, per_object);
  assert_eq!(summary.label_count, 3);

  let ids: Vec<usize> = table.universal_ids().values().copied().collect();
  assert_eq!(ids, (1..=summary.label_count).collect::<Vec<_>>());
}

#[test]
fn test_hard_label_always_has_max_support() {
  let table = TruthTable::from_yaml_str(
    "a: {x: 0.3, y: 0.3, z: 0.1}\nb: {q: 2, p: 2}\nc: {m: 0.9, n: 0.95}\nd: solo\n",
  )
  .unwrap();
  for (object, label) in table.hard() {
    let supports = table.get(&object).unwrap();
    let max = supports.values().cloned().fold(f64::MIN, f64::max);
    assert_eq!(supports[&label], max);
    let first_max = supports.iter().find(|(_, s)| **s == max).map(|(l, _)| l.clone()).unwrap();
    assert_eq!(label, first_max);
  }
  assert_eq!(table.hard()["a"], "x");
  assert_eq!(table.hard()["b"], "p");
}

#[test]
fn test_crosstab_listing_against_truth_file() {
  let dir = TempDir::new().unwrap();
  let truth_path = write(dir.path(), "truth.yaml", "c1: {g1: 1.0}\nc2: {g1: 0.9, g2: 0.1}\nc3: {g2: 1.0}\nc4: g3\n");
  let listing_path = write(dir.path(), "clusters.mcl", "c1 c2\nc3 c9\n");

  let truth = read_truth(&truth_path).unwrap();
  let prediction = read_cluster_listing(&listing_path).unwrap();
  let table = crosstab(&truth, &prediction);

  assert_eq!(table.rows(), ["g1", "g2", "g3"]);
  assert_eq!(table.cols(), ["1", "2"]);
  assert_eq!(table.cell("g1", "1").unwrap(), 2);
  assert_eq!(table.cell("g2", "2").unwrap(), 1);
  assert_eq!(table.total(), 3);

  let tsv = dir.path().join("ctab.tsv");
  table.save_tsv(&tsv).unwrap();
  let text = std::fs::read_to_string(&tsv).unwrap();
  assert_eq!(text, "\t1\t2\ng1\t2\t0\ng2\t0\t1\ng3\t0\t0\n");
}

#[test]
fn test_corrupted_table_survives_disk_round_trip() {
  let dir = TempDir::new().unwrap();
  let truth = TruthTable::from_raw((0..30).map(|i| (format!("obj{i}"), if i % 2 == 0 { "even" } else { "odd" })))
    .unwrap();
  let params = CorruptionParams::new(0.4, 0.4).with_extra_symbols(["novel"]);
  let corrupted = corrupt_seeded(&truth, &params, 2024).unwrap();

  let path = dir.path().join("corrupted.yaml");
  corrupted.write_full(&path).unwrap();
  assert_eq!(read_truth(&path).unwrap(), corrupted);
  assert_eq!(corrupted.len(), truth.len());
}

#[test]
fn test_noise_replicates_written_and_reproducible() {
  let dir = TempDir::new().unwrap();
  let input = write(dir.path(), "contacts.graphml", GRAPH);
  let params = NoiseParams::new(31337, 0.1).with_replicates(3);
  let injector = NoiseInjector::new(params).unwrap();

  let out_a = dir.path().join("a");
  let out_b = dir.path().join("b");
  let reports_a = injector.run_file(&input, &out_a).unwrap();
  let reports_b = injector.run_file(&input, &out_b).unwrap();
  assert_eq!(reports_a.len(), 3);

  for k in 1..=3 {
    let name = format!("contacts_nsy{k}.graphml");
    let a = std::fs::read(out_a.join(&name)).unwrap();
    let b = std::fs::read(out_b.join(&name)).unwrap();
    assert_eq!(a, b, "replicate {k} differs between runs");

    let noisy = ContactGraph::load(&out_a.join(&name)).unwrap();
    // floor(77 * 0.1) = 7 spurious observations
    assert_eq!(noisy.total_weight(), 84.0);
    assert_eq!(reports_a[k - 1].injected, 7);
  }
  assert!(!out_a.join("contacts_nsy1.graphml.tmp").exists());

  let original = ContactGraph::load(&input).unwrap();
  assert_eq!(original.total_weight(), 77.0);
}

#[test]
fn test_failed_replicate_leaves_no_output() {
  let dir = TempDir::new().unwrap();
  let input = write(dir.path(), "contacts.graphml", GRAPH);
  let out = dir.path().join("out");
  // a directory in the way of replicate 2's staging file makes its write fail
  std::fs::create_dir_all(out.join("contacts_nsy2.graphml.tmp")).unwrap();

  let injector = NoiseInjector::new(NoiseParams::new(31337, 0.1).with_replicates(3)).unwrap();
  assert!(injector.run_file(&input, &out).is_err());

  let mut left: Vec<String> = std::fs::read_dir(&out)
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .collect();
  left.sort();
  assert_eq!(left, vec!["contacts_nsy2.graphml.tmp".to_string()]);
}

#[test]
fn test_replicates_differ_from_each_other() {
  let graph = hicbench_core::graph::parse_graphml(GRAPH).unwrap();
  let injector = NoiseInjector::new(NoiseParams::new(8, 2.0).with_replicates(2)).unwrap();
  let reps = injector.generate(&graph).unwrap();
  assert_ne!(reps[0].seed, reps[1].seed);

  let render = |g: &ContactGraph| {
    let mut buf = Vec::new();
    g.write_graphml(&mut buf).unwrap();
    buf
  };
  // 154 draws over four nodes; identical outcomes are practically impossible
  assert_ne!(render(&reps[0].graph), render(&reps[1].graph));
}

#[test]
fn test_truth_table_found_above_cluster_output() {
  let root = TempDir::new().unwrap();
  write(root.path(), "truth.yaml", "c1: g1\n");
  let cluster_dir = root.path().join("cluster").join("mcl");
  std::fs::create_dir_all(&cluster_dir).unwrap();

  let found = search_up(&cluster_dir, "truth.yaml", 4).unwrap();
  assert_eq!(read_truth(&found).unwrap().len(), 1);

  let missing = search_up(&cluster_dir, "alignment.bam", 1);
  assert!(matches!(missing, Err(Error::MissingCollaboratorFile { .. })));
}
