use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  /// Input table, listing or graph violates its schema.
  #[error("Malformed input: {0}")]
  MalformedInput(String),

  /// A companion file (ground truth, alignment, ...) could not be located.
  #[error("Could not find {name}; searched: {}", format_searched(.searched))]
  MissingCollaboratorFile { name: String, searched: Vec<PathBuf> },

  /// A length-weighted draw did not resolve to a usable node.
  #[error("Sampling failed at draw {draw} of total length {total_length}: {snapshot}")]
  Sampling {
    draw: u64,
    total_length: u64,
    snapshot: String,
  },

  /// An operation referenced an id outside the expected universe.
  #[error("Consistency: {0}")]
  Consistency(String),

  #[error("Invalid parameter: {0}")]
  InvalidParameter(String),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),

  #[error("YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("TOML parse error: {0}")]
  Toml(#[from] toml::de::Error),
}

fn format_searched(searched: &[PathBuf]) -> String {
  searched
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject probabilities outside `[0, 1]` before they reach a sampler.
pub(crate) fn check_probability(name: &str, p: f64) -> Result<()> {
  if p.is_finite() && (0.0..=1.0).contains(&p) {
    Ok(())
  } else {
    Err(Error::InvalidParameter(format!("{name} must lie in [0, 1], got {p}")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_file_lists_search_path() {
    let err = Error::MissingCollaboratorFile {
      name: "truth.yaml".to_string(),
      searched: vec![PathBuf::from("/a/b"), PathBuf::from("/a")],
    };
    assert_eq!(err.to_string(), "Could not find truth.yaml; searched: /a/b, /a");
  }

  #[test]
  fn test_check_probability() {
    assert!(check_probability("p", 0.0).is_ok());
    assert!(check_probability("p", 1.0).is_ok());
    assert!(check_probability("p", -0.1).is_err());
    assert!(check_probability("p", f64::NAN).is_err());
  }
}
