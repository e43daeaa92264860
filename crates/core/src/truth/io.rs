//! Reading and writing truth tables.
//!
//! Two inputs are understood: YAML tables (full or hard form) and cluster
//! membership listings, where each line names the members of one cluster and
//! the cluster id is the 1-based line number.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

use super::{RawAssignment, Supports, TruthTable};
use crate::{Error, Result};

/// Read a YAML truth table from disk.
pub fn read_truth(path: &Path) -> Result<TruthTable> {
  let file = File::open(path)?;
  let value: Value = serde_yaml::from_reader(BufReader::new(file))?;
  let table = TruthTable::from_yaml_value(value)?;
  debug!("Read {} objects from {}", table.len(), path.display());
  Ok(table)
}

/// Read a cluster membership listing from disk.
pub fn read_cluster_listing(path: &Path) -> Result<TruthTable> {
  let file = File::open(path)?;
  let table = TruthTable::from_cluster_listing(BufReader::new(file))?;
  debug!("Read {} objects from {}", table.len(), path.display());
  Ok(table)
}

impl TruthTable {
  pub fn from_yaml_str(text: &str) -> Result<Self> {
    let value: Value = serde_yaml::from_str(text)?;
    Self::from_yaml_value(value)
  }

  /// Accepts `object: label` and `object: {label: support, ...}` rows.
  pub fn from_yaml_value(value: Value) -> Result<Self> {
    let rows = match value {
      Value::Null => return Ok(Self::new()),
      Value::Mapping(rows) => rows,
      other => {
        return Err(Error::MalformedInput(format!(
          "truth table must be a mapping of objects, found {}",
          kind_of(&other)
        )));
      }
    };

    let mut raw = Vec::with_capacity(rows.len());
    for (object, value) in rows {
      let object = scalar_text(&object)
        .ok_or_else(|| Error::MalformedInput(format!("object key must be a scalar, found {}", kind_of(&object))))?;
      let assignment = match value {
        Value::Mapping(labels) => {
          let mut supports = Supports::new();
          for (label, support) in labels {
            let label = scalar_text(&label)
              .ok_or_else(|| Error::MalformedInput(format!("object '{object}' has a non-scalar label")))?;
            let support = support.as_f64().ok_or_else(|| {
              Error::MalformedInput(format!("object '{object}' label '{label}' has non-numeric support"))
            })?;
            supports.insert(label, support);
          }
          RawAssignment::Supports(supports)
        }
        other => match scalar_text(&other) {
          Some(label) => RawAssignment::Label(label),
          None => {
            return Err(Error::MalformedInput(format!(
              "object '{object}' must map to a label or a label-support mapping, found {}",
              kind_of(&other)
            )));
          }
        },
      };
      raw.push((object, assignment));
    }
    Self::from_raw(raw)
  }

  /// Parse a cluster membership listing.
  ///
  /// Every token on line `i` receives label `i` with support 1.0; objects may
  /// appear on several lines. Lines may differ in length but must not be blank.
  ///
  /// Labels are zero-padded to the width of the last line number, so string
  /// order matches line order and universal id `i` is line `i`.
  pub fn from_cluster_listing<R: BufRead>(reader: R) -> Result<Self> {
    let mut lines = Vec::new();
    for (n, line) in reader.lines().enumerate() {
      let line_no = n + 1;
      let line = line.map_err(|e| match e.kind() {
        ErrorKind::InvalidData => Error::MalformedInput(format!("line {line_no} is not valid UTF-8")),
        _ => Error::Io(e),
      })?;
      if line.trim().is_empty() {
        return Err(Error::MalformedInput(format!("line {line_no} lists no members")));
      }
      lines.push(line);
    }

    let width = lines.len().to_string().len();
    let mut members: BTreeMap<String, Supports> = BTreeMap::new();
    for (n, line) in lines.iter().enumerate() {
      let cluster = format!("{:0width$}", n + 1);
      for object in line.split_whitespace() {
        members.entry(object.to_string()).or_default().insert(cluster.clone(), 1.0);
      }
    }
    Self::from_raw(members)
  }

  /// Write the full table (object → label → support).
  pub fn write_full(&self, path: &Path) -> Result<()> {
    write_yaml(self.assignments(), path)
  }

  /// Write object → ascending label list.
  pub fn write_soft(&self, path: &Path) -> Result<()> {
    write_yaml(&self.soft(), path)
  }

  /// Write object → ascending list of universal label ids.
  pub fn write_soft_universal(&self, path: &Path) -> Result<()> {
    write_yaml(&self.soft_universal(), path)
  }

  /// Write object → single most significant label.
  pub fn write_hard(&self, path: &Path) -> Result<()> {
    write_yaml(&self.hard(), path)
  }
}

fn write_yaml<T: Serialize>(value: &T, path: &Path) -> Result<()> {
  let mut writer = BufWriter::new(File::create(path)?);
  serde_yaml::to_writer(&mut writer, value)?;
  writer.flush()?;
  Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn kind_of(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Sequence(_) => "a sequence",
    Value::Mapping(_) => "a mapping",
    Value::Tagged(_) => "a tagged value",
  }
}
