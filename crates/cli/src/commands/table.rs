//! Truth table commands: corrupt, crosstab, convert, summary

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hicbench_core::{
  Config, CorruptionParams, TruthTable, corrupt_seeded, crosstab, read_cluster_listing, read_truth, search_up,
};
use tracing::info;

use crate::TableForm;

/// YAML files are truth tables; anything else is read as a cluster listing.
fn load_table(path: &Path) -> Result<TruthTable> {
  let is_yaml = path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
  let table = if is_yaml {
    read_truth(path)
  } else {
    read_cluster_listing(path)
  };
  table.with_context(|| format!("Failed to read table {}", path.display()))
}

pub fn cmd_corrupt(
  config: &Config,
  table: &Path,
  output: &Path,
  p_mutate: Option<f64>,
  p_indel: Option<f64>,
  extra: Vec<String>,
  seed: Option<u64>,
) -> Result<()> {
  let input = load_table(table)?;
  let extra = if extra.is_empty() {
    config.corrupt.extra_symbols.clone()
  } else {
    extra
  };
  let params = CorruptionParams::new(
    p_mutate.unwrap_or(config.corrupt.p_mutate),
    p_indel.unwrap_or(config.corrupt.p_indel),
  )
  .with_extra_symbols(extra);

  let corrupted = corrupt_seeded(&input, &params, seed.unwrap_or(config.corrupt.seed))?;
  corrupted
    .write_full(output)
    .with_context(|| format!("Failed to write {}", output.display()))?;
  info!("Wrote corrupted table to {}", output.display());
  Ok(())
}

pub fn cmd_crosstab(config: &Config, prediction: &Path, truth: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
  let truth = match truth {
    Some(path) => path,
    None => {
      let start = prediction
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
      search_up(start, &config.files.truth_table, config.files.max_search_depth)?
    }
  };
  info!("Comparing {} against {}", prediction.display(), truth.display());

  let truth_table = load_table(&truth)?;
  let predicted = load_table(prediction)?;
  let table = crosstab(&truth_table, &predicted);
  info!(
    "{} shared objects over {} truth and {} predicted labels",
    table.total(),
    table.rows().len(),
    table.cols().len()
  );

  match output {
    Some(path) => table
      .save_tsv(&path)
      .with_context(|| format!("Failed to write {}", path.display()))?,
    None => {
      let stdout = std::io::stdout();
      let mut lock = stdout.lock();
      table.write_tsv(&mut lock)?;
      lock.flush()?;
    }
  }
  Ok(())
}

pub fn cmd_convert(input: &Path, form: TableForm, output: &Path) -> Result<()> {
  let table = load_table(input)?;
  let written = match form {
    TableForm::Full => table.write_full(output),
    TableForm::Soft => table.write_soft(output),
    TableForm::SoftUniversal => table.write_soft_universal(output),
    TableForm::Hard => table.write_hard(output),
  };
  written.with_context(|| format!("Failed to write {}", output.display()))?;
  info!("Wrote {:?} form of {} objects to {}", form, table.len(), output.display());
  Ok(())
}

pub fn cmd_summary(input: &Path, json: bool) -> Result<()> {
  let summary = load_table(input)?.summary();
  if json {
    println!("{}", serde_json::to_string_pretty(&summary)?);
  } else {
    print!("{summary}");
  }
  Ok(())
}
