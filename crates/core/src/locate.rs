//! Locating companion files produced by earlier pipeline steps.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

/// Find `file_name` in `start` or one of its ancestors, nearest first.
///
/// At most `max_depth` parent directories are visited above `start`.
pub fn search_up(start: &Path, file_name: &str, max_depth: usize) -> Result<PathBuf> {
  let mut searched = Vec::new();
  for dir in start.ancestors().take(max_depth + 1) {
    let candidate = dir.join(file_name);
    if candidate.is_file() {
      debug!("Found {} at {}", file_name, candidate.display());
      return Ok(candidate);
    }
    searched.push(dir.to_path_buf());
  }
  Err(Error::MissingCollaboratorFile {
    name: file_name.to_string(),
    searched,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_finds_nearest_ancestor() {
    let root = TempDir::new().unwrap();
    let deep = root.path().join("map").join("run1").join("cluster");
    std::fs::create_dir_all(&deep).unwrap();
    std::fs::write(root.path().join("truth.yaml"), "a: 1\n").unwrap();
    std::fs::write(root.path().join("map").join("truth.yaml"), "a: 2\n").unwrap();

    let found = search_up(&deep, "truth.yaml", 8).unwrap();
    assert_eq!(found, root.path().join("map").join("truth.yaml"));
  }

  #[test]
  fn test_missing_reports_search_path() {
    let root = TempDir::new().unwrap();
    let deep = root.path().join("x").join("y");
    std::fs::create_dir_all(&deep).unwrap();

    let err = search_up(&deep, "absent.yaml", 1).unwrap_err();
    match err {
      Error::MissingCollaboratorFile { name, searched } => {
        assert_eq!(name, "absent.yaml");
        assert_eq!(searched, vec![deep.clone(), root.path().join("x")]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }
}
