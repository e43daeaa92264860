//! Weighted contact graphs using petgraph.
//!
//! Nodes are contigs carrying a sequence `length`; undirected edges carry the
//! observed contact count as `weight`. Repeated observations of the same pair
//! accumulate weight rather than adding parallel edges.

mod graphml;

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::{Error, Result};

pub use graphml::parse_graphml;

/// A sequence node.
#[derive(Debug, Clone, PartialEq)]
pub struct Contig {
  pub id: String,
  pub length: u64,
  /// Other node attributes, kept verbatim for round-tripping
  pub attrs: BTreeMap<String, String>,
}

/// An undirected contact between two contigs.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
  pub weight: f64,
  pub attrs: BTreeMap<String, String>,
}

/// Declared value types of attributes, keyed by attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttrTypes {
  pub node: BTreeMap<String, String>,
  pub edge: BTreeMap<String, String>,
  /// Declared for both nodes and edges
  pub all: BTreeMap<String, String>,
}

impl Default for AttrTypes {
  fn default() -> Self {
    Self {
      node: BTreeMap::from([("length".to_string(), "long".to_string())]),
      edge: BTreeMap::from([("weight".to_string(), "double".to_string())]),
      all: BTreeMap::new(),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct ContactGraph {
  graph: UnGraph<Contig, Contact>,
  id_to_node: BTreeMap<String, NodeIndex>,
  attr_types: AttrTypes,
}

impl ContactGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Read a GraphML file.
  pub fn load(path: &Path) -> Result<Self> {
    let text = fs::read_to_string(path)?;
    let graph = parse_graphml(&text)?;
    debug!(
      "Loaded graph {} with {} nodes and {} edges",
      path.display(),
      graph.node_count(),
      graph.edge_count()
    );
    Ok(graph)
  }

  /// Write GraphML to `path` through a temporary sibling, so a failed write
  /// never leaves a truncated file under the final name.
  pub fn save(&self, path: &Path) -> Result<()> {
    let tmp = staging_path(path);
    self.stage(&tmp)?;
    fs::rename(&tmp, path)?;
    Ok(())
  }

  /// Write GraphML to a staging file, removing it again if the write fails.
  pub(crate) fn stage(&self, tmp: &Path) -> Result<()> {
    if let Err(e) = self.write_file(tmp) {
      let _ = fs::remove_file(tmp);
      return Err(e);
    }
    Ok(())
  }

  fn write_file(&self, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    self.write_graphml(&mut writer)?;
    writer.flush()?;
    Ok(())
  }

  /// Add a contig; ids must be unique.
  pub fn add_contig(&mut self, id: &str, length: u64) -> Result<NodeIndex> {
    self.insert_contig(Contig {
      id: id.to_string(),
      length,
      attrs: BTreeMap::new(),
    })
  }

  pub(crate) fn insert_contig(&mut self, contig: Contig) -> Result<NodeIndex> {
    if self.id_to_node.contains_key(&contig.id) {
      return Err(Error::MalformedInput(format!("duplicate node id '{}'", contig.id)));
    }
    let id = contig.id.clone();
    let idx = self.graph.add_node(contig);
    self.id_to_node.insert(id, idx);
    Ok(idx)
  }

  /// Record `weight` observations between two contigs.
  pub fn add_contact(&mut self, u: &str, v: &str, weight: f64) -> Result<()> {
    self.insert_contact(
      u,
      v,
      Contact {
        weight,
        attrs: BTreeMap::new(),
      },
    )
  }

  pub(crate) fn insert_contact(&mut self, u: &str, v: &str, contact: Contact) -> Result<()> {
    let a = self.require(u)?;
    let b = self.require(v)?;
    match self.graph.find_edge(a, b) {
      Some(edge) => self.graph[edge].weight += contact.weight,
      None => {
        self.graph.add_edge(a, b, contact);
      }
    }
    Ok(())
  }

  /// Add one observation between two nodes, creating the edge if needed.
  pub(crate) fn bump_contact(&mut self, a: NodeIndex, b: NodeIndex) {
    match self.graph.find_edge(a, b) {
      Some(edge) => self.graph[edge].weight += 1.0,
      None => {
        self.graph.add_edge(
          a,
          b,
          Contact {
            weight: 1.0,
            attrs: BTreeMap::new(),
          },
        );
      }
    }
  }

  fn require(&self, id: &str) -> Result<NodeIndex> {
    self
      .id_to_node
      .get(id)
      .copied()
      .ok_or_else(|| Error::Consistency(format!("node '{id}' is not in the graph")))
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  pub fn contains(&self, id: &str) -> bool {
    self.id_to_node.contains_key(id)
  }

  pub fn contig(&self, id: &str) -> Option<&Contig> {
    self.id_to_node.get(id).map(|&idx| &self.graph[idx])
  }

  /// Contigs in ascending id order.
  pub fn contigs(&self) -> impl Iterator<Item = (NodeIndex, &Contig)> {
    self.id_to_node.values().map(|&idx| (idx, &self.graph[idx]))
  }

  pub(crate) fn contig_at(&self, idx: NodeIndex) -> &Contig {
    &self.graph[idx]
  }

  /// Weight between two contigs, if they are connected.
  pub fn weight(&self, u: &str, v: &str) -> Option<f64> {
    let a = *self.id_to_node.get(u)?;
    let b = *self.id_to_node.get(v)?;
    self.graph.find_edge(a, b).map(|e| self.graph[e].weight)
  }

  /// Edges in insertion order as (source id, target id, contact).
  pub fn contacts(&self) -> impl Iterator<Item = (&str, &str, &Contact)> {
    self.graph.edge_references().map(|e| {
      (
        self.graph[e.source()].id.as_str(),
        self.graph[e.target()].id.as_str(),
        e.weight(),
      )
    })
  }

  /// Sum of edge weights, i.e. the number of observed contacts.
  pub fn total_weight(&self) -> f64 {
    self.graph.edge_weights().map(|c| c.weight).sum()
  }

  pub(crate) fn attr_types(&self) -> &AttrTypes {
    &self.attr_types
  }

  pub(crate) fn set_attr_types(&mut self, types: AttrTypes) {
    self.attr_types = types;
  }
}

/// `<path>.tmp`, next to the final file so the rename stays on one filesystem.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
  let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  tmp_name.push(".tmp");
  path.with_file_name(tmp_name)
}
