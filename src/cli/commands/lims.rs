use clap::{Args, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::lims::{GalaxyApiAccess, LimsApi};

#[derive(Args)]
pub struct LimsArgs {
    /// Galaxy base URL
    #[arg(long, env = "BROADRUN_LIMS_URL")]
    pub url: String,

    /// Galaxy API key
    #[arg(long, env = "BROADRUN_LIMS_KEY", hide_env_values = true)]
    pub key: String,

    #[command(subcommand)]
    pub command: LimsCommands,
}

#[derive(Subcommand)]
pub enum LimsCommands {
    /// Show details for a sequencing run
    RunDetails {
        /// Run barcode
        run: String,

        /// Run date to try if the barcode is not found
        #[arg(long)]
        run_date: Option<String>,
    },

    /// List sequencing projects
    Projects,

    /// Report items sequenced between two dates
    Report { start: String, end: String },

    /// Upload a sequencing run summary from a JSON file
    UploadSummary {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn run(args: LimsArgs) -> anyhow::Result<()> {
    let galaxy = GalaxyApiAccess::new(&args.url, &args.key)?;

    let value = match args.command {
        LimsCommands::RunDetails { run, run_date } => {
            galaxy.run_details(&run, run_date.as_deref())?
        }
        LimsCommands::Projects => galaxy.sequencing_projects()?,
        LimsCommands::Report { start, end } => galaxy.sqn_report(&start, &end)?,
        LimsCommands::UploadSummary { file } => {
            let contents = std::fs::read_to_string(&file)?;
            let run_info: Value = serde_json::from_str(&contents)?;
            galaxy.sqn_run_summary(&run_info)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
