//! Label tally for a truth table.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::TruthTable;

/// Counts describing a table's labels and how degenerate its assignments are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSummary {
  /// Distinct labels in the table
  pub label_count: usize,
  /// Sum over objects of their label counts
  pub assignment_count: usize,
  pub object_count: usize,
  /// Average excess labels per object, as a percentage above 1:1
  pub degeneracy_pct: f64,
  /// Per-label tallies, most frequent first
  pub labels: Vec<LabelTally>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelTally {
  pub label: String,
  pub universal_id: usize,
  pub count: usize,
  /// Share of all assignments carrying this label
  pub fraction: f64,
}

impl TableSummary {
  pub(crate) fn from_table(table: &TruthTable) -> Self {
    let assignment_count: usize = table.assignments().values().map(|s| s.len()).sum();
    let object_count = table.len();
    let degeneracy_pct = if object_count == 0 {
      0.0
    } else {
      100.0 * assignment_count as f64 / object_count as f64 - 100.0
    };

    let mut labels: Vec<LabelTally> = table
      .label_frequency()
      .iter()
      .map(|(label, &count)| LabelTally {
        label: label.clone(),
        universal_id: table.universal_id(label).unwrap_or_default(),
        count,
        fraction: if assignment_count == 0 {
          0.0
        } else {
          count as f64 / assignment_count as f64
        },
      })
      .collect();
    // stable sort keeps ascending label order among equal counts
    labels.sort_by(|a, b| b.count.cmp(&a.count));

    Self {
      label_count: table.label_frequency().len(),
      assignment_count,
      object_count,
      degeneracy_pct,
      labels,
    }
  }
}

impl fmt::Display for TableSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "{} symbols in table, {} assignments of {} objects ({:.1}% degeneracy)",
      self.label_count, self.assignment_count, self.object_count, self.degeneracy_pct
    )?;
    writeln!(f, "ext_symb\tint_symb\tcount\tpercentage")?;
    for tally in &self.labels {
      writeln!(
        f,
        "{}\t{}\t{}\t{:5.3}",
        tally.label, tally.universal_id, tally.count, tally.fraction
      )?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::truth::Supports;

  fn scenario() -> TruthTable {
    let s = |pairs: &[(&str, f64)]| pairs.iter().map(|(l, v)| (l.to_string(), *v)).collect::<Supports>();
    TruthTable::from_raw([
      ("o1", s(&[("A", 1.0)])),
      ("o2", s(&[("A", 0.5), ("B", 0.5)])),
      ("o3", s(&[("B", 1.0)])),
    ])
    .unwrap()
  }

  #[test]
  fn test_counts_and_degeneracy() {
    let summary = scenario().summary();
    assert_eq!(summary.label_count, 2);
    assert_eq!(summary.assignment_count, 4);
    assert_eq!(summary.object_count, 3);
    assert!((summary.degeneracy_pct - 33.333_333).abs() < 1e-4);
  }

  #[test]
  fn test_labels_sorted_by_descending_frequency() {
    let table = TruthTable::from_raw([("a", "x"), ("b", "y"), ("c", "y"), ("d", "z"), ("e", "y")]).unwrap();
    let summary = table.summary();
    let order: Vec<&str> = summary.labels.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(order, vec!["y", "x", "z"]);
    assert_eq!(summary.labels[0].count, 3);
    assert!((summary.labels[0].fraction - 0.6).abs() < 1e-12);
    assert_eq!(summary.labels[0].universal_id, 2);
  }

  #[test]
  fn test_empty_table() {
    let summary = TruthTable::new().summary();
    assert_eq!(summary.object_count, 0);
    assert_eq!(summary.degeneracy_pct, 0.0);
    assert!(summary.labels.is_empty());
  }

  #[test]
  fn test_display_header() {
    let text = scenario().summary().to_string();
    assert!(text.starts_with("2 symbols in table, 4 assignments of 3 objects (33.3% degeneracy)"));
    assert!(text.contains("A\t1\t2\t0.500"));
  }
}
