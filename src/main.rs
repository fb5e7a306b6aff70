use broadrun::cli::{commands, Cli, Commands};
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // BROADRUN_LOG sets the default level; RUST_LOG overrides it
    let log_level = match cli.verbose {
        0 => std::env::var("BROADRUN_LOG").unwrap_or_else(|_| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<broadrun::BroadError>() {
            Some(broadrun::BroadError::Config(_)) => 2,
            Some(broadrun::BroadError::Io(_)) => 3,
            Some(broadrun::BroadError::ToolNotFound { .. }) => 4,
            Some(broadrun::BroadError::ExternalProcess { .. }) => 5,
            Some(broadrun::BroadError::ApiDecode(_))
            | Some(broadrun::BroadError::Http(_))
            | Some(broadrun::BroadError::LimsLookup(_)) => 6,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config.as_ref();

    match cli.command {
        Commands::Gatk(args) => commands::gatk::run_gatk(args, config),
        Commands::Mutect(args) => commands::gatk::run_mutect(args, config),
        Commands::Picard(args) => commands::picard::run(args, config),
        Commands::PicardFn(args) => commands::picard::run_fn(args, config),
        Commands::Version(args) => commands::gatk::run_version(args, config),
        Commands::Lims(args) => commands::lims::run(args),
    }
}
