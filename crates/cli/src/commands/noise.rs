//! Contact-graph noise injection

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hicbench_core::{Config, NoiseInjector, NoiseParams};
use tracing::info;

/// Write `replicates` noisy copies of `graph`.
pub fn cmd_noise(
  config: &Config,
  seed: u64,
  error_rate: f64,
  replicates: Option<usize>,
  output_dir: Option<PathBuf>,
  json: bool,
  graph: &Path,
) -> Result<()> {
  let replicates = replicates.unwrap_or(config.noise.replicates);
  let output_dir = output_dir.unwrap_or_else(|| config.noise.output_dir.clone());

  let injector = NoiseInjector::new(NoiseParams::new(seed, error_rate).with_replicates(replicates))?;
  let reports = injector
    .run_file(graph, &output_dir)
    .with_context(|| format!("Noise injection failed for {}", graph.display()))?;

  if json {
    println!("{}", serde_json::to_string_pretty(&reports)?);
  } else {
    for report in &reports {
      info!(
        "Replicate {} (seed {}): +{} observations, |e| {} -> {}",
        report.index, report.seed, report.injected, report.edges_before, report.edges_after
      );
    }
  }
  Ok(())
}
