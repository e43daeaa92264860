//! CLI command implementations

mod config;
mod noise;
mod table;

pub use config::cmd_config_show;
pub use noise::cmd_noise;
pub use table::{cmd_convert, cmd_corrupt, cmd_crosstab, cmd_summary};
