//! Spurious contact injection for contact graphs.
//!
//! A replicate adds `floor(total_weight * noise_rate)` observations between
//! node pairs drawn in proportion to sequence length: longer contigs are more
//! exposed and so attract more spurious contacts. Observations on an existing
//! pair raise its weight; otherwise a new edge of weight 1 is created.
//!
//! Replicate seeds are drawn in one batch from the primary seed before any
//! replicate runs, so replicate `k` is reproducible on its own.

use std::ops::Range;
use std::path::{Path, PathBuf};

use petgraph::graph::NodeIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::graph::{ContactGraph, staging_path};
use crate::{Error, Result};

/// Range replicate seeds are drawn from.
pub const REPLICATE_SEED_RANGE: Range<u64> = 1_000_000..5_000_000;

/// Nodes listed in a sampling error before the snapshot is cut short.
const SNAPSHOT_LIMIT: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct NoiseParams {
  /// Primary seed from which replicate seeds derive
  pub seed: u64,
  /// Spurious observations as a fraction of total edge weight
  pub noise_rate: f64,
  pub replicates: usize,
}

impl NoiseParams {
  pub fn new(seed: u64, noise_rate: f64) -> Self {
    Self {
      seed,
      noise_rate,
      replicates: 1,
    }
  }

  pub fn with_replicates(mut self, replicates: usize) -> Self {
    self.replicates = replicates;
    self
  }

  fn validate(&self) -> Result<()> {
    if !self.noise_rate.is_finite() || self.noise_rate < 0.0 {
      return Err(Error::InvalidParameter(format!(
        "noise rate must be a non-negative number, got {}",
        self.noise_rate
      )));
    }
    Ok(())
  }
}

/// Per-replicate seeds drawn from the primary seed.
pub fn replicate_seeds(primary: u64, count: usize) -> Vec<u64> {
  let mut rng = StdRng::seed_from_u64(primary);
  (0..count).map(|_| rng.gen_range(REPLICATE_SEED_RANGE)).collect()
}

/// Number of observations a replicate injects.
pub fn injected_edge_count(total_weight: f64, noise_rate: f64) -> u64 {
  (total_weight * noise_rate).floor() as u64
}

/// `<input stem>_nsy<k>.graphml`
pub fn replicate_file_name(input: &Path, index: usize) -> String {
  let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
  format!("{stem}_nsy{index}.graphml")
}

/// Cumulative length over nodes in ascending id order.
///
/// Position 0 is a zero-length sentinel mapped to the first node. A draw in
/// `[0, total_length)` resolves to the first entry whose prefix sum exceeds
/// it, found by binary search.
#[derive(Debug, Clone)]
pub struct LengthIndex {
  nodes: Vec<NodeIndex>,
  prefix: Vec<u64>,
  /// Nodes that can actually be drawn (non-zero length)
  drawable: usize,
}

impl LengthIndex {
  pub fn build(graph: &ContactGraph) -> Self {
    let mut nodes = Vec::with_capacity(graph.node_count() + 1);
    let mut prefix = Vec::with_capacity(graph.node_count() + 1);
    let mut drawable = 0;
    let mut running = 0u64;

    nodes.push(NodeIndex::end());
    prefix.push(0);
    for (idx, contig) in graph.contigs() {
      running += contig.length;
      nodes.push(idx);
      prefix.push(running);
      if contig.length > 0 {
        drawable += 1;
      }
    }
    if nodes.len() > 1 {
      nodes[0] = nodes[1];
    }

    Self {
      nodes,
      prefix,
      drawable,
    }
  }

  pub fn total_length(&self) -> u64 {
    self.prefix.last().copied().unwrap_or(0)
  }

  pub fn drawable_nodes(&self) -> usize {
    self.drawable
  }

  /// Draw one node with probability proportional to its length.
  pub fn sample<R: Rng + ?Sized>(&self, graph: &ContactGraph, rng: &mut R) -> Result<NodeIndex> {
    let total = self.total_length();
    if total == 0 {
      return Err(self.sampling_error(graph, 0, "graph has no sequence length to sample from"));
    }
    self.locate(graph, rng.gen_range(0..total))
  }

  /// Node owning position `draw` of the concatenated lengths.
  pub fn locate(&self, graph: &ContactGraph, draw: u64) -> Result<NodeIndex> {
    let pos = self.prefix.partition_point(|&p| p <= draw);
    match self.nodes.get(pos) {
      Some(&idx) if pos < self.prefix.len() => Ok(idx),
      _ => Err(self.sampling_error(graph, draw, "draw lies beyond the last node")),
    }
  }

  fn sampling_error(&self, graph: &ContactGraph, draw: u64, reason: &str) -> Error {
    let shown: Vec<String> = self
      .nodes
      .iter()
      .zip(&self.prefix)
      .skip(1)
      .take(SNAPSHOT_LIMIT)
      .map(|(&idx, end)| format!("{}@{end}", graph.contig_at(idx).id))
      .collect();
    let more = self.nodes.len().saturating_sub(1 + SNAPSHOT_LIMIT);
    let mut snapshot = format!("{reason}; index [{}]", shown.join(", "));
    if more > 0 {
      snapshot.push_str(&format!(" (+{more} more)"));
    }
    Error::Sampling {
      draw,
      total_length: self.total_length(),
      snapshot,
    }
  }
}

/// Inject `n_edges` length-weighted observations into a copy of `graph`.
///
/// The second endpoint of each observation is redrawn until it differs from
/// the first. That loop cannot finish when fewer than two nodes have non-zero
/// length, so such graphs are rejected before sampling starts.
pub fn inject_edges<R: Rng + ?Sized>(
  graph: &ContactGraph,
  index: &LengthIndex,
  n_edges: u64,
  rng: &mut R,
) -> Result<ContactGraph> {
  let mut noisy = graph.clone();
  if n_edges == 0 {
    return Ok(noisy);
  }
  if index.drawable_nodes() < 2 {
    return Err(index.sampling_error(
      graph,
      0,
      "fewer than two nodes with non-zero length; no distinct second endpoint exists",
    ));
  }

  for _ in 0..n_edges {
    let u = index.sample(graph, rng)?;
    let v = loop {
      let v = index.sample(graph, rng)?;
      if v != u {
        break v;
      }
    };
    noisy.bump_contact(u, v);
  }
  Ok(noisy)
}

/// One noised copy of the input graph.
#[derive(Debug, Clone)]
pub struct Replicate {
  /// 1-based replicate number
  pub index: usize,
  pub seed: u64,
  pub injected: u64,
  pub graph: ContactGraph,
}

/// What a replicate did, for logs and machine-readable reports.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplicateReport {
  pub index: usize,
  pub seed: u64,
  pub injected: u64,
  pub nodes_before: usize,
  pub edges_before: usize,
  pub nodes_after: usize,
  pub edges_after: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,
}

/// Runs every replicate for one input graph.
#[derive(Debug, Clone)]
pub struct NoiseInjector {
  params: NoiseParams,
}

impl NoiseInjector {
  pub fn new(params: NoiseParams) -> Result<Self> {
    params.validate()?;
    Ok(Self { params })
  }

  pub fn params(&self) -> &NoiseParams {
    &self.params
  }

  /// Generate all replicates in memory.
  pub fn generate(&self, graph: &ContactGraph) -> Result<Vec<Replicate>> {
    let mut out = Vec::with_capacity(self.params.replicates);
    self.each_replicate(graph, |replicate| {
      out.push(replicate);
      Ok(())
    })?;
    Ok(out)
  }

  /// Load `input` and write every replicate into `output_dir`.
  ///
  /// Replicates are staged as `.tmp` files and only renamed into place once
  /// all of them have been written; on failure the staged files are removed
  /// and no `_nsy<k>` file appears.
  pub fn run_file(&self, input: &Path, output_dir: &Path) -> Result<Vec<ReplicateReport>> {
    let graph = ContactGraph::load(input)?;
    std::fs::create_dir_all(output_dir)?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.params.replicates);
    let mut reports = Vec::with_capacity(self.params.replicates);
    let built = self.each_replicate(&graph, |replicate| {
      let path = output_dir.join(replicate_file_name(input, replicate.index));
      let tmp = staging_path(&path);
      replicate.graph.stage(&tmp)?;
      staged.push((tmp, path.clone()));
      let mut report = report_for(&graph, &replicate);
      report.path = Some(path);
      reports.push(report);
      Ok(())
    });
    if let Err(e) = built {
      discard(&staged);
      return Err(e);
    }

    for (n, (tmp, path)) in staged.iter().enumerate() {
      if let Err(e) = std::fs::rename(tmp, path) {
        discard(&staged[n..]);
        return Err(e.into());
      }
      info!("Wrote {}", path.display());
    }
    Ok(reports)
  }

  fn each_replicate<F>(&self, graph: &ContactGraph, mut emit: F) -> Result<()>
  where
    F: FnMut(Replicate) -> Result<()>,
  {
    let total_weight = graph.total_weight();
    let n_edges = injected_edge_count(total_weight, self.params.noise_rate);
    info!("Total graph weight {total_weight}");
    info!(
      "Specified rate {:.3e} will generate {n_edges} spurious observations",
      self.params.noise_rate
    );

    let seeds = replicate_seeds(self.params.seed, self.params.replicates);
    // the input graph is never modified, so one index serves every replicate
    let index = LengthIndex::build(graph);
    debug!(
      "Length index over {} nodes, total length {}",
      graph.node_count(),
      index.total_length()
    );

    for (n, seed) in seeds.into_iter().enumerate() {
      let replicate_no = n + 1;
      info!("Graph {replicate_no}, using random seed {seed}");
      let mut rng = StdRng::seed_from_u64(seed);
      let noisy = inject_edges(graph, &index, n_edges, &mut rng)?;
      info!(
        "Initial graph |n|={} |e|={}; noisy graph |n|={} |e|={}",
        graph.node_count(),
        graph.edge_count(),
        noisy.node_count(),
        noisy.edge_count()
      );
      emit(Replicate {
        index: replicate_no,
        seed,
        injected: n_edges,
        graph: noisy,
      })?;
    }
    Ok(())
  }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
  for (tmp, _) in staged {
    let _ = std::fs::remove_file(tmp);
  }
}

fn report_for(input: &ContactGraph, replicate: &Replicate) -> ReplicateReport {
  ReplicateReport {
    index: replicate.index,
    seed: replicate.seed,
    injected: replicate.injected,
    nodes_before: input.node_count(),
    edges_before: input.edge_count(),
    nodes_after: replicate.graph.node_count(),
    edges_after: replicate.graph.edge_count(),
    path: None,
  }
}

impl Replicate {
  pub fn report(&self, input: &ContactGraph) -> ReplicateReport {
    report_for(input, self)
  }
}
