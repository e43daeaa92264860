//! Configuration with per-project overrides.
//!
//! Config priority: explicit path > project-relative (./hicbench.toml) >
//! user (~/.config/hicbench/config.toml) > defaults. Command-line flags are
//! applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

pub const PROJECT_CONFIG_FILE: &str = "hicbench.toml";

// ============================================================================
// Noise Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
  /// Number of noisy replicates per input graph
  pub replicates: usize,

  /// Directory receiving `<name>_nsy<k>.graphml` files
  pub output_dir: PathBuf,
}

impl Default for NoiseConfig {
  fn default() -> Self {
    Self {
      replicates: 1,
      output_dir: PathBuf::from("."),
    }
  }
}

// ============================================================================
// Corruption Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorruptConfig {
  /// Probability of swapping one label for an unused symbol
  pub p_mutate: f64,

  /// Probability of inserting or deleting one label
  pub p_indel: f64,

  /// Generator seed
  pub seed: u64,

  /// Symbols available for insertion beyond those already in the table
  pub extra_symbols: Vec<String>,
}

// ============================================================================
// Companion Files
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesConfig {
  /// Ground-truth table name searched for above clustering results
  pub truth_table: String,

  /// Parent directories visited when searching
  pub max_search_depth: usize,
}

impl Default for FilesConfig {
  fn default() -> Self {
    Self {
      truth_table: "truth.yaml".to_string(),
      max_search_depth: 16,
    }
  }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
  /// error, warn, info, debug or trace; RUST_LOG overrides
  pub level: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
  #[serde(default)]
  pub noise: NoiseConfig,

  #[serde(default)]
  pub corrupt: CorruptConfig,

  #[serde(default)]
  pub files: FilesConfig,

  #[serde(default)]
  pub log: LogConfig,
}

impl Config {
  /// Parse a config file. Unlike [`load_for_project`](Self::load_for_project),
  /// a file that exists but cannot be parsed is an error.
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
  }

  /// Load config for a working directory, with fallback to user config
  pub fn load_for_project(project_path: &Path) -> Self {
    let project_config = Self::project_config_path(project_path);
    if project_config.exists()
      && let Ok(content) = std::fs::read_to_string(&project_config)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }

    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(content) = std::fs::read_to_string(&user_config_path)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }

    Self::default()
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("hicbench").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("hicbench").join("config.toml"))
  }

  pub fn project_config_path(project_path: &Path) -> PathBuf {
    project_path.join(PROJECT_CONFIG_FILE)
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    let defaults = Self::default();
    format!(
      r#"# hicbench configuration
# Place at ./{PROJECT_CONFIG_FILE} or ~/.config/hicbench/config.toml

[noise]
# Noisy replicates generated per input graph
replicates = {replicates}
# Where <name>_nsy<k>.graphml files are written
output_dir = "{output_dir}"

[corrupt]
# Probability of swapping one label for an unused symbol
p_mutate = {p_mutate:?}
# Probability of inserting or deleting one label
p_indel = {p_indel:?}
seed = {seed}
# Extra symbols available for insertion
extra_symbols = []

[files]
# Ground-truth table searched for above clustering results
truth_table = "{truth_table}"
max_search_depth = {max_search_depth}

[log]
# error, warn, info, debug, trace (RUST_LOG overrides)
level = "{level}"
"#,
      replicates = defaults.noise.replicates,
      output_dir = defaults.noise.output_dir.display(),
      p_mutate = defaults.corrupt.p_mutate,
      p_indel = defaults.corrupt.p_indel,
      seed = defaults.corrupt.seed,
      truth_table = defaults.files.truth_table,
      max_search_depth = defaults.files.max_search_depth,
      level = defaults.log.level,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.noise.replicates, 1);
    assert_eq!(config.files.truth_table, "truth.yaml");
    assert_eq!(config.log.level, "info");
    assert_eq!(config.corrupt.p_mutate, 0.0);
  }

  #[test]
  fn test_partial_config_fills_defaults() {
    let toml_content = r#"
[noise]
replicates = 5

[corrupt]
p_indel = 0.2
extra_symbols = ["X"]
"#;
    let config: Config = toml::from_str(toml_content).unwrap();
    assert_eq!(config.noise.replicates, 5);
    assert_eq!(config.noise.output_dir, PathBuf::from("."));
    assert_eq!(config.corrupt.p_indel, 0.2);
    assert_eq!(config.corrupt.extra_symbols, vec!["X".to_string()]);
    assert_eq!(config.files.max_search_depth, 16);
  }

  #[test]
  fn test_template_parses_to_defaults() {
    let parsed: Config = toml::from_str(&Config::generate_template()).unwrap();
    assert_eq!(parsed, Config::default());
  }

  #[test]
  fn test_project_config_takes_priority() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "[log]\nlevel = \"debug\"\n").unwrap();
    let config = Config::load_for_project(dir.path());
    assert_eq!(config.log.level, "debug");
  }

  #[test]
  fn test_load_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[noise\nreplicates = ").unwrap();
    assert!(Config::load(&path).is_err());
  }
}
