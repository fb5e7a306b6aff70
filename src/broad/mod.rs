//! Work with Broad's Java tools.
//!
//! - Picard: BAM manipulation and analysis.
//! - GATK: next-generation sequence processing.
//! - MuTect: paired tumor/normal somatic calling, built on GATK.

pub mod command;
pub mod jvm;
pub mod locator;
pub mod picard;
pub mod runner;
pub mod version;

pub use command::{analysis_type, CommandBuilder};
pub use jvm::{context_jvm_opts, RuntimeContext};
pub use locator::ToolLocator;
pub use picard::{PicardArgs, PicardFunction};
pub use runner::{BroadRunner, ToolConfig};
pub use version::{classify_distribution, version_exceeds, GatkType, VersionResolver};

use std::path::PathBuf;

use crate::core::config::{PipelineConfig, ProgramField};
use crate::Result;

/// Locate Picard from the configuration.
///
/// Picard comes either as a directory of per-command jars, configured with
/// `[resources.picard] dir = "/path/to/jars"`, or as a wrapper script such as
/// the Debian `picard-tools`, configured with `cmd = "picard-tools"`. A
/// wrapper command wins when it resolves to something other than a directory.
pub fn picard_ref(config: &PipelineConfig) -> Result<PathBuf> {
    match config.get_program("picard", ProgramField::Cmd) {
        Ok(cmd) if !cmd.is_dir() => Ok(cmd),
        _ => config.get_program("picard", ProgramField::Dir),
    }
}

/// Build a runner for `program` (usually `gatk` or `mutect`) from the
/// configuration.
pub fn runner_from_config(config: &PipelineConfig, program: &str) -> Result<BroadRunner> {
    let picard = picard_ref(config)?;
    let tool_dir = config.get_program(program, ProgramField::Dir).ok();
    Ok(BroadRunner::new(&picard, tool_dir.as_deref(), config))
}
