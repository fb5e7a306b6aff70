pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{load_config, PipelineConfig};
use crate::core::paths::default_config_path;

#[derive(Parser)]
#[command(
    name = "broadrun",
    version,
    about = "Run Picard, GATK and MuTect and query sequencing LIMS",
    long_about = "broadrun locates Broad Institute Java tools, builds version aware command \
                  lines for them, and talks to the next-gen LIMS REST API."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true, env = "BROADRUN_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a GATK walker
    Gatk(commands::gatk::GatkArgs),

    /// Run the MuTect paired caller
    Mutect(commands::gatk::GatkArgs),

    /// Run a Picard command with KEY=VALUE options
    Picard(commands::picard::PicardArgs),

    /// Run a pre-built Picard operation by name
    PicardFn(commands::picard::PicardFnArgs),

    /// Show installed tool versions
    Version(commands::gatk::VersionArgs),

    /// Query the next-gen LIMS
    Lims(commands::lims::LimsArgs),
}

/// Load the configuration given on the command line, then the default
/// location, falling back to built-in defaults.
pub fn load_pipeline_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    if let Some(path) = path {
        return Ok(load_config(path)?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        tracing::debug!("Loading configuration from {}", default_path.display());
        Ok(load_config(&default_path)?)
    } else {
        Ok(PipelineConfig::default())
    }
}
