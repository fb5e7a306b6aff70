use clap::Args;
use colored::*;
use std::path::PathBuf;

use crate::broad::runner_from_config;
use crate::cli::load_pipeline_config;

#[derive(Args)]
pub struct GatkArgs {
    /// Temporary directory (a scratch directory is used if not given)
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// Arguments passed to the tool, e.g. -T PrintReads -I in.bam
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub params: Vec<String>,
}

#[derive(Args)]
pub struct VersionArgs {
    /// Also report the version of this Picard command
    #[arg(long, value_name = "COMMAND")]
    pub picard: Option<String>,
}

pub fn run_gatk(args: GatkArgs, config: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = load_pipeline_config(config)?;
    let runner = runner_from_config(&config, "gatk")?;
    runner.run_gatk(&args.params, args.tmp_dir.as_deref())?;
    Ok(())
}

pub fn run_mutect(args: GatkArgs, config: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = load_pipeline_config(config)?;
    let runner = runner_from_config(&config, "mutect")?;
    runner.run_mutect(&args.params, args.tmp_dir.as_deref())?;
    Ok(())
}

pub fn run_version(args: VersionArgs, config: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = load_pipeline_config(config)?;
    let runner = runner_from_config(&config, "gatk")?;

    let version = runner.get_gatk_version()?;
    let gatk_type = runner.gatk_type()?;
    println!("{} {} ({})", "GATK".bold(), version, gatk_type.to_string().cyan());

    if let Some(command) = args.picard {
        let picard_version = runner.get_picard_version(&command)?;
        println!("{} {} {}", "Picard".bold(), command, picard_version);
    }
    Ok(())
}
