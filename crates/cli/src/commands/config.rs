//! Configuration commands

use anyhow::Result;
use hicbench_core::Config;

/// Print a commented config template with default values
pub fn cmd_config_show() -> Result<()> {
  print!("{}", Config::generate_template());
  Ok(())
}
