//! Cross-tabulation of two truth tables on their hard projections.
//!
//! The resulting contingency table is what external scorers (F1, V-measure,
//! B-cubed) consume.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::truth::TruthTable;
use crate::{Error, Result};

/// Counts of shared objects indexed by (row label, column label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
  rows: Vec<String>,
  cols: Vec<String>,
  counts: Vec<Vec<u64>>,
}

/// Cross-tabulate `a` (rows) against `b` (columns).
///
/// Rows and columns cover every label of each table's full assignments, so
/// labels that never win a hard projection still get a (zero) line. Only
/// objects present in both tables are counted.
pub fn crosstab(a: &TruthTable, b: &TruthTable) -> ContingencyTable {
  let rows: Vec<String> = a.labels().map(str::to_string).collect();
  let cols: Vec<String> = b.labels().map(str::to_string).collect();
  let row_pos: BTreeMap<&str, usize> = rows.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();
  let col_pos: BTreeMap<&str, usize> = cols.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();

  let mut counts = vec![vec![0u64; cols.len()]; rows.len()];
  let hard_b = b.hard();
  for (object, label_a) in a.hard() {
    let Some(label_b) = hard_b.get(&object) else {
      continue;
    };
    if let (Some(&r), Some(&c)) = (row_pos.get(label_a.as_str()), col_pos.get(label_b.as_str())) {
      counts[r][c] += 1;
    }
  }

  ContingencyTable { rows, cols, counts }
}

impl ContingencyTable {
  pub fn rows(&self) -> &[String] {
    &self.rows
  }

  pub fn cols(&self) -> &[String] {
    &self.cols
  }

  /// Count for a (row, column) label pair.
  pub fn cell(&self, row: &str, col: &str) -> Result<u64> {
    let r = self
      .rows
      .iter()
      .position(|l| l == row)
      .ok_or_else(|| Error::Consistency(format!("row label '{row}' not in contingency table")))?;
    let c = self
      .cols
      .iter()
      .position(|l| l == col)
      .ok_or_else(|| Error::Consistency(format!("column label '{col}' not in contingency table")))?;
    Ok(self.counts[r][c])
  }

  /// Number of objects counted (present in both tables).
  pub fn total(&self) -> u64 {
    self.counts.iter().flatten().sum()
  }

  pub fn row_totals(&self) -> Vec<u64> {
    self.counts.iter().map(|row| row.iter().sum()).collect()
  }

  pub fn col_totals(&self) -> Vec<u64> {
    (0..self.cols.len())
      .map(|c| self.counts.iter().map(|row| row[c]).sum())
      .collect()
  }

  /// Tab-separated rendering: a header of column labels, then one line per row label.
  pub fn write_tsv<W: Write>(&self, mut out: W) -> Result<()> {
    let mut header = String::new();
    for col in &self.cols {
      header.push('\t');
      header.push_str(col);
    }
    writeln!(out, "{header}")?;
    for (label, row) in self.rows.iter().zip(&self.counts) {
      let cells: Vec<String> = row.iter().map(u64::to_string).collect();
      if cells.is_empty() {
        writeln!(out, "{label}")?;
      } else {
        writeln!(out, "{label}\t{}", cells.join("\t"))?;
      }
    }
    Ok(())
  }

  pub fn save_tsv(&self, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    self.write_tsv(&mut writer)?;
    writer.flush()?;
    Ok(())
  }
}
