//! GraphML subset for contact graphs.
//!
//! Reads `<key>` declarations, an undirected `<graph>`, nodes with a `length`
//! data entry and edges with a `weight` data entry. Any other declared data
//! attributes are carried through unchanged. Output lists nodes in ascending
//! id order and edges in insertion order, so equal graphs serialise to equal
//! bytes.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::io::Write;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use super::{AttrTypes, Contact, ContactGraph, Contig};
use crate::{Error, Result};

const LENGTH_ATTR: &str = "length";
const WEIGHT_ATTR: &str = "weight";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
  Node,
  Edge,
  /// `for="all"` or no `for`: applies to nodes and edges alike
  All,
  Graph,
}

#[derive(Debug)]
struct KeyDecl {
  domain: Domain,
  name: String,
}

/// Element currently being assembled from its `<data>` children.
#[derive(Debug)]
enum Pending {
  Node { id: String, data: BTreeMap<String, String> },
  Edge { source: String, target: String, data: BTreeMap<String, String> },
}

fn xml_err(e: impl Display) -> Error {
  Error::MalformedInput(format!("GraphML: {e}"))
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
  let mut out = HashMap::new();
  for attr in e.attributes() {
    let attr = attr.map_err(xml_err)?;
    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
    out.insert(key, value);
  }
  Ok(out)
}

fn required(attrs: &mut HashMap<String, String>, name: &str, element: &str) -> Result<String> {
  attrs
    .remove(name)
    .ok_or_else(|| Error::MalformedInput(format!("GraphML: <{element}> is missing '{name}'")))
}

/// Parse GraphML text into a contact graph.
pub fn parse_graphml(text: &str) -> Result<ContactGraph> {
  let mut reader = Reader::from_str(text);
  reader.config_mut().trim_text(true);

  let mut keys: HashMap<String, KeyDecl> = HashMap::new();
  let mut types = AttrTypes::default();
  let mut nodes: Vec<Contig> = Vec::new();
  let mut edges: Vec<(String, String, Contact)> = Vec::new();
  let mut pending: Option<Pending> = None;
  let mut data_key: Option<String> = None;
  let mut data_text = String::new();

  loop {
    let event = reader.read_event().map_err(xml_err)?;
    let (start, closes) = match &event {
      Event::Start(e) => (Some(e), false),
      Event::Empty(e) => (Some(e), true),
      _ => (None, false),
    };

    if let Some(e) = start {
      let mut attrs = attributes(e)?;
      match e.local_name().as_ref() {
        b"key" => {
          let id = required(&mut attrs, "id", "key")?;
          let name = attrs.remove("attr.name").unwrap_or_else(|| id.clone());
          let ty = attrs.remove("attr.type").unwrap_or_else(|| "string".to_string());
          let domain = match attrs.get("for").map(String::as_str) {
            Some("node") => Domain::Node,
            Some("edge") => Domain::Edge,
            Some("graph") => Domain::Graph,
            _ => Domain::All,
          };
          match domain {
            Domain::Node => {
              types.node.insert(name.clone(), ty);
            }
            Domain::Edge => {
              types.edge.insert(name.clone(), ty);
            }
            Domain::All => {
              types.all.insert(name.clone(), ty);
            }
            Domain::Graph => {}
          }
          keys.insert(id, KeyDecl { domain, name });
        }
        b"graph" => {
          if attrs.get("edgedefault").map(String::as_str) == Some("directed") {
            return Err(Error::MalformedInput("GraphML: contact graphs must be undirected".to_string()));
          }
        }
        b"node" => {
          let id = required(&mut attrs, "id", "node")?;
          let node = Pending::Node {
            id,
            data: BTreeMap::new(),
          };
          if closes {
            nodes.push(finish_node(node)?);
          } else {
            pending = Some(node);
          }
        }
        b"edge" => {
          let source = required(&mut attrs, "source", "edge")?;
          let target = required(&mut attrs, "target", "edge")?;
          let edge = Pending::Edge {
            source,
            target,
            data: BTreeMap::new(),
          };
          if closes {
            edges.push(finish_edge(edge)?);
          } else {
            pending = Some(edge);
          }
        }
        b"data" => {
          let key = required(&mut attrs, "key", "data")?;
          data_text.clear();
          if closes {
            store_data(&keys, pending.as_mut(), &key, String::new())?;
          } else {
            data_key = Some(key);
          }
        }
        _ => {}
      }
      continue;
    }

    match event {
      Event::Text(t) if data_key.is_some() => {
        data_text.push_str(&t.unescape().map_err(xml_err)?);
      }
      Event::CData(t) if data_key.is_some() => {
        data_text.push_str(&String::from_utf8_lossy(&t));
      }
      Event::End(e) => match e.local_name().as_ref() {
        b"data" => {
          if let Some(key) = data_key.take() {
            store_data(&keys, pending.as_mut(), &key, std::mem::take(&mut data_text))?;
          }
        }
        b"node" => match pending.take() {
          Some(node @ Pending::Node { .. }) => nodes.push(finish_node(node)?),
          _ => return Err(Error::MalformedInput("GraphML: unbalanced </node>".to_string())),
        },
        b"edge" => match pending.take() {
          Some(edge @ Pending::Edge { .. }) => edges.push(finish_edge(edge)?),
          _ => return Err(Error::MalformedInput("GraphML: unbalanced </edge>".to_string())),
        },
        _ => {}
      },
      Event::Eof => break,
      _ => {}
    }
  }

  let mut graph = ContactGraph::new();
  for contig in nodes {
    graph.insert_contig(contig)?;
  }
  for (source, target, contact) in edges {
    for end in [&source, &target] {
      if !graph.contains(end) {
        return Err(Error::MalformedInput(format!("GraphML: edge references undeclared node '{end}'")));
      }
    }
    graph.insert_contact(&source, &target, contact)?;
  }
  graph.set_attr_types(types);
  Ok(graph)
}

fn store_data(keys: &HashMap<String, KeyDecl>, pending: Option<&mut Pending>, key: &str, value: String) -> Result<()> {
  let decl = keys
    .get(key)
    .ok_or_else(|| Error::MalformedInput(format!("GraphML: data references undeclared key '{key}'")))?;
  match (pending, decl.domain) {
    (Some(Pending::Node { data, .. }), Domain::Node | Domain::All) => {
      data.insert(decl.name.clone(), value);
    }
    (Some(Pending::Edge { data, .. }), Domain::Edge | Domain::All) => {
      data.insert(decl.name.clone(), value);
    }
    // graph-level data is not carried
    _ => {}
  }
  Ok(())
}

fn finish_node(node: Pending) -> Result<Contig> {
  let Pending::Node { id, mut data } = node else {
    return Err(Error::MalformedInput("GraphML: expected a node".to_string()));
  };
  let raw = data
    .remove(LENGTH_ATTR)
    .ok_or_else(|| Error::MalformedInput(format!("GraphML: node '{id}' has no length")))?;
  let length = parse_length(&raw)
    .ok_or_else(|| Error::MalformedInput(format!("GraphML: node '{id}' has invalid length '{raw}'")))?;
  Ok(Contig {
    id,
    length,
    attrs: data,
  })
}

fn finish_edge(edge: Pending) -> Result<(String, String, Contact)> {
  let Pending::Edge {
    source,
    target,
    mut data,
  } = edge
  else {
    return Err(Error::MalformedInput("GraphML: expected an edge".to_string()));
  };
  let raw = data
    .remove(WEIGHT_ATTR)
    .ok_or_else(|| Error::MalformedInput(format!("GraphML: edge {source}-{target} has no weight")))?;
  let weight = raw
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|w| w.is_finite() && *w >= 0.0)
    .ok_or_else(|| Error::MalformedInput(format!("GraphML: edge {source}-{target} has invalid weight '{raw}'")))?;
  Ok((source, target, Contact { weight, attrs: data }))
}

/// Lengths may be written as integers or integral floats.
fn parse_length(raw: &str) -> Option<u64> {
  let raw = raw.trim();
  if let Ok(n) = raw.parse::<u64>() {
    return Some(n);
  }
  let f = raw.parse::<f64>().ok()?;
  (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then_some(f as u64)
}

fn is_integral_type(ty: &str) -> bool {
  matches!(ty, "int" | "long")
}

fn format_weight(weight: f64, ty: &str) -> String {
  if is_integral_type(ty) {
    format!("{}", weight.round() as i64)
  } else {
    format!("{weight}")
  }
}

impl ContactGraph {
  /// Serialise as GraphML.
  pub fn write_graphml<W: Write>(&self, mut out: W) -> Result<()> {
    let types = self.attr_types();
    let mut edge_types = types.edge.clone();
    // an integral declaration cannot hold fractional counts
    if let Some(ty) = edge_types.get_mut(WEIGHT_ATTR)
      && is_integral_type(ty.as_str())
      && self.contacts().any(|(_, _, c)| c.weight.fract() != 0.0)
    {
      *ty = "double".to_string();
    }
    let mut node_keys = BTreeMap::new();
    let mut edge_keys = BTreeMap::new();
    let mut shared_keys = BTreeMap::new();

    writeln!(out, "<?xml version='1.0' encoding='utf-8'?>")?;
    writeln!(
      out,
      "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\" \
       xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
       xsi:schemaLocation=\"http://graphml.graphdrawing.org/xmlns \
       http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd\">"
    )?;
    let mut next = 0usize;
    for (domain, declared, ids) in [
      ("node", &types.node, &mut node_keys),
      ("edge", &edge_types, &mut edge_keys),
      ("all", &types.all, &mut shared_keys),
    ] {
      for (name, ty) in declared {
        let id = format!("d{next}");
        next += 1;
        writeln!(
          out,
          "  <key id=\"{id}\" for=\"{domain}\" attr.name=\"{}\" attr.type=\"{}\" />",
          escape(name.as_str()),
          escape(ty.as_str())
        )?;
        ids.insert(name.clone(), id);
      }
    }

    writeln!(out, "  <graph edgedefault=\"undirected\">")?;
    for (_, contig) in self.contigs() {
      writeln!(out, "    <node id=\"{}\">", escape(contig.id.as_str()))?;
      let length = contig.length.to_string();
      let values = std::iter::once((LENGTH_ATTR, length.as_str()))
        .chain(contig.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
      write_data(&mut out, &node_keys, &shared_keys, values)?;
      writeln!(out, "    </node>")?;
    }

    let weight_type = edge_types.get(WEIGHT_ATTR).map(String::as_str).unwrap_or("double");
    for (source, target, contact) in self.contacts() {
      writeln!(
        out,
        "    <edge source=\"{}\" target=\"{}\">",
        escape(source),
        escape(target)
      )?;
      let weight = format_weight(contact.weight, weight_type);
      let values = std::iter::once((WEIGHT_ATTR, weight.as_str()))
        .chain(contact.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
      write_data(&mut out, &edge_keys, &shared_keys, values)?;
      writeln!(out, "    </edge>")?;
    }
    writeln!(out, "  </graph>")?;
    writeln!(out, "</graphml>")?;
    Ok(())
  }
}

fn write_data<'a, W: Write>(
  out: &mut W,
  key_ids: &BTreeMap<String, String>,
  shared_ids: &BTreeMap<String, String>,
  values: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<()> {
  for (name, value) in values {
    let Some(id) = key_ids.get(name).or_else(|| shared_ids.get(name)) else {
      continue;
    };
    writeln!(out, "      <data key=\"{id}\">{}</data>", escape(value))?;
  }
  Ok(())
}
