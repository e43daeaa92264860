//! hicbench CLI - truth tables, label corruption and contact-graph noise

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hicbench_core::Config;

mod commands;
mod logging;

use commands::{cmd_config_show, cmd_convert, cmd_corrupt, cmd_crosstab, cmd_noise, cmd_summary};
use logging::init_logging;

#[derive(Parser)]
#[command(name = "hicbench")]
#[command(about = "Benchmark inputs for metagenomic contact-graph clustering")]
#[command(version)]
#[command(after_help = "\
EXAMPLES:
  hicbench noise -s 1234 -p 0.05 -n 10 contacts.graphml
  hicbench crosstab clusters.mcl --truth truth.yaml -o ctab.tsv
  hicbench corrupt truth.yaml --p-mutate 0.1 --extra X -o noisy.yaml
  hicbench summary truth.yaml")]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Config file (default: ./hicbench.toml, then user config)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

/// Serialised forms of a truth table
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TableForm {
  /// object -> label -> support
  Full,
  /// object -> ascending label list
  Soft,
  /// object -> ascending universal label ids
  SoftUniversal,
  /// object -> single most significant label
  Hard,
}

#[derive(Subcommand)]
enum Commands {
  /// Add random length-weighted edges to a contact graph
  Noise {
    /// Primary seed
    #[arg(short, long)]
    seed: u64,

    /// Rate of error edges relative to total edge weight
    #[arg(short = 'p', long)]
    error_rate: f64,

    /// Number of replicate graphs to generate (default: config noise.replicates)
    #[arg(short = 'n', long)]
    replicates: Option<usize>,

    /// Directory for <name>_nsy<k>.graphml outputs (default: config noise.output_dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print replicate reports as JSON
    #[arg(long)]
    json: bool,

    /// Graph to inject noise
    #[arg(value_name = "GRAPHML")]
    graph: PathBuf,
  },

  /// Introduce label error into a truth table
  Corrupt {
    /// Truth table (YAML) or cluster listing
    table: PathBuf,

    /// Output path for the corrupted table (full YAML form)
    #[arg(short, long)]
    output: PathBuf,

    /// Probability of a class mutation
    #[arg(long)]
    p_mutate: Option<f64>,

    /// Probability of a class insertion or deletion
    #[arg(long)]
    p_indel: Option<f64>,

    /// Extra class symbols available for insertion (repeatable)
    #[arg(long = "extra", value_name = "SYMBOL")]
    extra: Vec<String>,

    /// Generator seed
    #[arg(long)]
    seed: Option<u64>,
  },

  /// Cross-tabulate a clustering against the ground truth
  Crosstab {
    /// Clustering result: truth table (YAML) or cluster listing
    prediction: PathBuf,

    /// Ground-truth table (default: searched for above the prediction)
    #[arg(long)]
    truth: Option<PathBuf>,

    /// Write the contingency table here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Rewrite a table in another form
  Convert {
    input: PathBuf,

    #[arg(long, value_enum, default_value = "full")]
    form: TableForm,

    #[arg(short, long)]
    output: PathBuf,
  },

  /// Print label tallies for a table
  Summary {
    input: PathBuf,

    /// Print as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print a configuration template
  Config,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let config = match &cli.config {
    Some(path) => Config::load(path).with_context(|| format!("Failed to read config {}", path.display()))?,
    None => {
      let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
      Config::load_for_project(&cwd)
    }
  };
  init_logging(&config.log.level, cli.verbose);

  match cli.command {
    Commands::Noise {
      seed,
      error_rate,
      replicates,
      output_dir,
      json,
      graph,
    } => cmd_noise(&config, seed, error_rate, replicates, output_dir, json, &graph),
    Commands::Corrupt {
      table,
      output,
      p_mutate,
      p_indel,
      extra,
      seed,
    } => cmd_corrupt(&config, &table, &output, p_mutate, p_indel, extra, seed),
    Commands::Crosstab {
      prediction,
      truth,
      output,
    } => cmd_crosstab(&config, &prediction, truth, output),
    Commands::Convert { input, form, output } => cmd_convert(&input, form, &output),
    Commands::Summary { input, json } => cmd_summary(&input, json),
    Commands::Config => cmd_config_show(),
  }
}
