//! Truth tables: multi-label object → class assignments with support values.
//!
//! A table represents either a ground truth or a prediction. Each object may
//! carry several labels; the support attached to a label is what the hard
//! projection uses to pick a single most significant class.
//!
//! All projections iterate objects and labels in ascending order, so every
//! derived view is independent of insertion order.

mod io;
mod summary;

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Result};

pub use io::{read_cluster_listing, read_truth};
pub use summary::{LabelTally, TableSummary};

/// Label → support for a single object.
pub type Supports = BTreeMap<String, f64>;

/// Raw per-object value accepted by [`TruthTable::load`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawAssignment {
  /// A bare label, taken with support 1.0.
  Label(String),
  /// Explicit label → support mapping.
  Supports(Supports),
}

impl From<&str> for RawAssignment {
  fn from(label: &str) -> Self {
    RawAssignment::Label(label.to_string())
  }
}

impl From<Supports> for RawAssignment {
  fn from(supports: Supports) -> Self {
    RawAssignment::Supports(supports)
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TruthTable {
  assignments: BTreeMap<String, Supports>,
  /// Number of objects carrying each label (presence, not summed support).
  label_frequency: BTreeMap<String, usize>,
  /// Label → 1-based id in ascending label order.
  universal_ids: BTreeMap<String, usize>,
}

impl TruthTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a table from raw assignments.
  pub fn from_raw<K, V>(raw: impl IntoIterator<Item = (K, V)>) -> Result<Self>
  where
    K: Into<String>,
    V: Into<RawAssignment>,
  {
    let mut table = Self::new();
    table.load(raw)?;
    Ok(table)
  }

  /// Replace all state from raw assignments.
  ///
  /// Either every row is accepted or the table is left untouched.
  pub fn load<K, V>(&mut self, raw: impl IntoIterator<Item = (K, V)>) -> Result<()>
  where
    K: Into<String>,
    V: Into<RawAssignment>,
  {
    let mut assignments = BTreeMap::new();
    for (object, value) in raw {
      let object = object.into();
      let supports = match value.into() {
        RawAssignment::Label(label) => Supports::from([(label, 1.0)]),
        RawAssignment::Supports(supports) => supports,
      };
      validate_supports(&object, &supports)?;
      assignments.insert(object, supports);
    }

    let mut label_frequency = BTreeMap::new();
    for supports in assignments.values() {
      for label in supports.keys() {
        *label_frequency.entry(label.clone()).or_insert(0) += 1;
      }
    }

    self.assignments = assignments;
    self.label_frequency = label_frequency;
    self.reindex();
    Ok(())
  }

  pub fn get(&self, object: &str) -> Option<&Supports> {
    self.assignments.get(object)
  }

  /// Insert or replace one object's assignments, keeping the label indexes current.
  pub fn put(&mut self, object: impl Into<String>, supports: Supports) -> Result<()> {
    let object = object.into();
    validate_supports(&object, &supports)?;

    if let Some(previous) = self.assignments.remove(&object) {
      for label in previous.keys() {
        if let Some(count) = self.label_frequency.get_mut(label) {
          *count -= 1;
          if *count == 0 {
            self.label_frequency.remove(label);
          }
        }
      }
    }
    for label in supports.keys() {
      *self.label_frequency.entry(label.clone()).or_insert(0) += 1;
    }
    self.assignments.insert(object, supports);
    self.reindex();
    Ok(())
  }

  fn reindex(&mut self) {
    self.universal_ids = self
      .label_frequency
      .keys()
      .enumerate()
      .map(|(n, label)| (label.clone(), n + 1))
      .collect();
  }

  pub fn len(&self) -> usize {
    self.assignments.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assignments.is_empty()
  }

  pub fn contains(&self, object: &str) -> bool {
    self.assignments.contains_key(object)
  }

  /// Object ids in ascending order.
  pub fn objects(&self) -> impl Iterator<Item = &str> {
    self.assignments.keys().map(String::as_str)
  }

  /// Every label used by any object, ascending.
  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self.label_frequency.keys().map(String::as_str)
  }

  pub fn assignments(&self) -> &BTreeMap<String, Supports> {
    &self.assignments
  }

  pub fn into_assignments(self) -> BTreeMap<String, Supports> {
    self.assignments
  }

  pub fn label_frequency(&self) -> &BTreeMap<String, usize> {
    &self.label_frequency
  }

  pub fn universal_ids(&self) -> &BTreeMap<String, usize> {
    &self.universal_ids
  }

  pub fn universal_id(&self, label: &str) -> Option<usize> {
    self.universal_ids.get(label).copied()
  }

  /// Single most significant label per object.
  ///
  /// Ties at the maximum support go to the lexicographically smallest label.
  pub fn hard(&self) -> BTreeMap<String, String> {
    self
      .assignments
      .iter()
      .filter_map(|(object, supports)| strongest_label(supports).map(|label| (object.clone(), label.to_string())))
      .collect()
  }

  /// Full label set per object, ascending.
  pub fn soft(&self) -> BTreeMap<String, Vec<String>> {
    self
      .assignments
      .iter()
      .map(|(object, supports)| (object.clone(), supports.keys().cloned().collect()))
      .collect()
  }

  /// Like [`soft`](Self::soft), with each label replaced by its universal id.
  pub fn soft_universal(&self) -> BTreeMap<String, Vec<usize>> {
    self
      .assignments
      .iter()
      .map(|(object, supports)| {
        let ids = supports
          .keys()
          .filter_map(|label| self.universal_ids.get(label).copied())
          .collect();
        (object.clone(), ids)
      })
      .collect()
  }

  pub fn to_vector(&self) -> LabelVector {
    LabelVector(self.hard())
  }

  pub fn summary(&self) -> TableSummary {
    TableSummary::from_table(self)
  }
}

/// Hard labels behind a plain lookup surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVector(BTreeMap<String, String>);

impl LabelVector {
  pub fn get(&self, object: &str) -> Option<&str> {
    self.0.get(object).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(o, l)| (o.as_str(), l.as_str()))
  }

  /// Distinct labels in use, ascending.
  pub fn unique_labels(&self) -> BTreeSet<&str> {
    self.0.values().map(String::as_str).collect()
  }

  pub fn into_inner(self) -> BTreeMap<String, String> {
    self.0
  }
}

fn strongest_label(supports: &Supports) -> Option<&str> {
  let mut best: Option<(&str, f64)> = None;
  for (label, &support) in supports {
    match best {
      Some((_, top)) if support <= top => {}
      _ => best = Some((label, support)),
    }
  }
  best.map(|(label, _)| label)
}

fn validate_supports(object: &str, supports: &Supports) -> Result<()> {
  if supports.is_empty() {
    return Err(Error::MalformedInput(format!("object '{object}' has no labels")));
  }
  for (label, support) in supports {
    if !support.is_finite() || *support < 0.0 {
      return Err(Error::MalformedInput(format!(
        "object '{object}' label '{label}' has invalid support {support}"
      )));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn supports(pairs: &[(&str, f64)]) -> Supports {
    pairs.iter().map(|(l, s)| (l.to_string(), *s)).collect()
  }

  fn sample_table() -> TruthTable {
    TruthTable::from_raw([
      ("o1", supports(&[("A", 1.0)])),
      ("o2", supports(&[("A", 0.5), ("B", 0.5)])),
      ("o3", supports(&[("B", 1.0)])),
    ])
    .unwrap()
  }

  #[test]
  fn test_hard_breaks_ties_lexicographically() {
    let hard = sample_table().hard();
    assert_eq!(hard["o1"], "A");
    assert_eq!(hard["o2"], "A");
    assert_eq!(hard["o3"], "B");
  }

  #[test]
  fn test_hard_picks_maximum_support() {
    let table = TruthTable::from_raw([("x", supports(&[("a", 0.1), ("b", 0.7), ("c", 0.7), ("d", 0.2)]))]).unwrap();
    assert_eq!(table.hard()["x"], "b");
  }

  #[test]
  fn test_soft_projections() {
    let table = sample_table();
    let soft = table.soft();
    assert_eq!(soft["o2"], vec!["A".to_string(), "B".to_string()]);
    assert_eq!(soft["o3"], vec!["B".to_string()]);

    let universal = table.soft_universal();
    assert_eq!(universal["o1"], vec![1]);
    assert_eq!(universal["o2"], vec![1, 2]);
    assert_eq!(universal["o3"], vec![2]);
  }

  #[test]
  fn test_universal_ids_follow_sorted_labels() {
    let table = TruthTable::from_raw([("x", "zeta"), ("y", "alpha"), ("z", "mu")]).unwrap();
    let ids: Vec<(&str, usize)> = table.universal_ids().iter().map(|(l, n)| (l.as_str(), *n)).collect();
    assert_eq!(ids, vec![("alpha", 1), ("mu", 2), ("zeta", 3)]);
    assert_eq!(
      table.universal_ids().keys().collect::<Vec<_>>(),
      table.label_frequency().keys().collect::<Vec<_>>()
    );
  }

  #[test]
  fn test_bare_label_gets_unit_support() {
    let table = TruthTable::from_raw([("x", "c1")]).unwrap();
    assert_eq!(table.get("x"), Some(&supports(&[("c1", 1.0)])));
  }

  #[test]
  fn test_get_unknown_is_absent() {
    assert!(sample_table().get("nope").is_none());
  }

  #[test]
  fn test_load_rejects_empty_object() {
    let mut table = sample_table();
    let err = table.load([("bad", Supports::new())]).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
    // failed load leaves previous state intact
    assert_eq!(table.len(), 3);
  }

  #[test]
  fn test_load_rejects_negative_support() {
    let err = TruthTable::from_raw([("x", supports(&[("a", -1.0)]))]).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
  }

  #[test]
  fn test_put_updates_frequencies() {
    let mut table = sample_table();
    table.put("o3", supports(&[("C", 2.0)])).unwrap();
    assert_eq!(table.label_frequency().get("B"), Some(&1));
    assert_eq!(table.label_frequency().get("C"), Some(&1));
    assert_eq!(table.universal_id("C"), Some(3));

    table.put("o2", supports(&[("A", 1.0)])).unwrap();
    assert!(table.label_frequency().get("B").is_none());
    assert_eq!(table.universal_id("C"), Some(2));
  }

  #[test]
  fn test_to_vector_matches_hard() {
    let table = sample_table();
    let vector = table.to_vector();
    assert_eq!(vector.get("o2"), Some("A"));
    assert_eq!(vector.get("missing"), None);
    assert_eq!(vector.len(), 3);
    assert_eq!(vector.into_inner(), table.hard());
  }

  #[test]
  fn test_unique_labels() {
    let vector = sample_table().to_vector();
    assert_eq!(vector.unique_labels().into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
  }
}
