use clap::Args;
use colored::*;
use std::io::Write;
use std::path::PathBuf;

use crate::broad::{picard_ref, BroadRunner, PicardArgs as FunctionArgs};
use crate::cli::load_pipeline_config;
use crate::process::RunMode;

#[derive(Args)]
pub struct PicardArgs {
    /// Picard command, e.g. SortSam
    pub command: String,

    /// Options as KEY=VALUE pairs
    #[arg(value_parser = parse_key_val)]
    pub options: Vec<(String, String)>,

    /// Launch in the background and return immediately
    #[arg(long, conflicts_with = "capture")]
    pub background: bool,

    /// Capture and print stdout instead of streaming it
    #[arg(long)]
    pub capture: bool,
}

#[derive(Args)]
pub struct PicardFnArgs {
    /// Operation name, e.g. picard_sort or picard_merge
    pub name: String,

    /// Input file (can be repeated)
    #[arg(short, long = "input", value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Reference FASTA
    #[arg(short, long, value_name = "FILE")]
    pub reference: Option<PathBuf>,

    /// Sort order for picard_sort
    #[arg(long)]
    pub sort_order: Option<String>,

    /// Remove rather than mark duplicates
    #[arg(long)]
    pub remove_duplicates: bool,
}

/// Parse a `KEY=VALUE` option
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

fn picard_runner(config: Option<&PathBuf>) -> anyhow::Result<BroadRunner> {
    let config = load_pipeline_config(config)?;
    let picard = picard_ref(&config)?;
    Ok(BroadRunner::new(&picard, None, &config))
}

pub fn run(args: PicardArgs, config: Option<&PathBuf>) -> anyhow::Result<()> {
    let runner = picard_runner(config)?;
    let mode = if args.background {
        RunMode::Background
    } else if args.capture {
        RunMode::CaptureStdout
    } else {
        RunMode::Synchronous
    };

    if let Some(stdout) = runner.run(&args.command, &args.options, mode)? {
        std::io::stdout().write_all(&stdout)?;
    }
    if args.background {
        println!("{} Picard {} launched", "✓".green(), args.command);
    }
    Ok(())
}

pub fn run_fn(args: PicardFnArgs, config: Option<&PathBuf>) -> anyhow::Result<()> {
    let runner = picard_runner(config)?;
    let function_args = FunctionArgs {
        inputs: args.inputs,
        output: args.output,
        reference: args.reference,
        sort_order: args.sort_order,
        remove_duplicates: args.remove_duplicates,
    };

    let out = runner.run_fn(&args.name, &function_args)?;
    println!("{} {}", "✓".green(), out.display());
    Ok(())
}
