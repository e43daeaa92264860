//! Controlled label corruption for stress-testing clustering metrics.
//!
//! Each object independently may have one label swapped for an unused symbol
//! (mutation) and may then gain or lose one label (indel). By default the
//! symbol universe is the set of labels already in the table; extra symbols
//! supply novelty when an object already carries every existing label.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::check_probability;
use crate::truth::{Supports, TruthTable};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorruptionParams {
  /// Probability of replacing one label with an unused symbol
  pub p_mutate: f64,
  /// Probability of inserting or deleting one label
  pub p_indel: f64,
  /// Symbols available for insertion beyond the table's own labels
  pub extra_symbols: Vec<String>,
}

impl CorruptionParams {
  pub fn new(p_mutate: f64, p_indel: f64) -> Self {
    Self {
      p_mutate,
      p_indel,
      extra_symbols: Vec::new(),
    }
  }

  pub fn with_extra_symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
    self.extra_symbols = symbols.into_iter().map(Into::into).collect();
    self
  }

  fn validate(&self) -> Result<()> {
    check_probability("p_mutate", self.p_mutate)?;
    check_probability("p_indel", self.p_indel)
  }
}

/// Corrupt a table with a generator seeded from `seed`.
pub fn corrupt_seeded(table: &TruthTable, params: &CorruptionParams, seed: u64) -> Result<TruthTable> {
  let mut rng = StdRng::seed_from_u64(seed);
  corrupt(table, params, &mut rng)
}

/// Produce a corrupted copy of `table`, drawing every decision from `rng`.
///
/// Objects are visited in ascending id order so a given generator state
/// always yields the same result. An object never loses its last label.
pub fn corrupt<R: Rng + ?Sized>(table: &TruthTable, params: &CorruptionParams, rng: &mut R) -> Result<TruthTable> {
  params.validate()?;

  let universe: BTreeSet<&str> = table
    .labels()
    .chain(params.extra_symbols.iter().map(String::as_str))
    .collect();
  info!(
    "Corrupting {} objects over {} symbols (p_mutate={}, p_indel={})",
    table.len(),
    universe.len(),
    params.p_mutate,
    params.p_indel
  );

  let mut changed = 0usize;
  let mut corrupted = Vec::with_capacity(table.len());
  for (object, original) in table.assignments() {
    let mut supports = original.clone();

    if rng.gen_bool(params.p_mutate) {
      let others = unused_symbols(&universe, &supports);
      if !others.is_empty() {
        let old = supports.keys().choose(rng).cloned();
        if let Some(old) = old {
          supports.remove(&old);
        }
        if let Some(new) = others.iter().choose(rng) {
          supports.insert(new.to_string(), 1.0);
        }
      }
    }

    if rng.gen_bool(params.p_indel) {
      // observes the label set left by the mutation step
      let others = unused_symbols(&universe, &supports);
      if rng.gen_bool(0.5) {
        if supports.len() > 1 {
          let victim = supports.keys().choose(rng).cloned();
          if let Some(victim) = victim {
            supports.remove(&victim);
          }
        }
      } else if let Some(new) = others.iter().choose(rng) {
        supports.insert(new.to_string(), 1.0);
      }
    }

    if !same_labels(original, &supports) {
      changed += 1;
    }
    corrupted.push((object.clone(), supports));
  }

  debug!("Corruption changed the label set of {changed} objects");
  TruthTable::from_raw(corrupted)
}

fn unused_symbols<'a>(universe: &BTreeSet<&'a str>, supports: &Supports) -> Vec<&'a str> {
  universe
    .iter()
    .copied()
    .filter(|symbol| !supports.contains_key(*symbol))
    .collect()
}

fn same_labels(a: &Supports, b: &Supports) -> bool {
  a.len() == b.len() && a.keys().zip(b.keys()).all(|(x, y)| x == y)
}
