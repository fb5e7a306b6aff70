//! Pipeline configuration consumed by the runners.
//!
//! Only the parts of the pipeline configuration this crate reads are
//! modelled: per-program resources and the algorithm block.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::paths::expand_path;
use crate::{BroadError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Resource overrides keyed by program name (`gatk`, `picard`, `mutect`)
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceConfig>,
    #[serde(default)]
    pub algorithm: AlgorithmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResourceConfig {
    pub jvm_opts: Option<Vec<String>>,
    /// Cached tool version, skips the version probe when set
    pub version: Option<String>,
    /// Directory holding the program's jars
    pub dir: Option<String>,
    /// Executable name or path
    pub cmd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlgorithmConfig {
    #[serde(default = "default_num_cores")]
    pub num_cores: u32,
    #[serde(default)]
    pub memory_adjust: Option<MemoryAdjust>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdjustDirection {
    Increase,
    Decrease,
}

/// Scale JVM heap settings up or down by an integer factor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryAdjust {
    pub direction: AdjustDirection,
    #[serde(default = "default_magnitude")]
    pub magnitude: u64,
}

/// Which resource field to read a program location from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramField {
    Dir,
    Cmd,
}

fn default_num_cores() -> u32 { 1 }
fn default_magnitude() -> u64 { 1 }

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            num_cores: default_num_cores(),
            memory_adjust: None,
        }
    }
}

impl MemoryAdjust {
    pub fn increase(magnitude: u64) -> Self {
        Self { direction: AdjustDirection::Increase, magnitude }
    }

    pub fn decrease(magnitude: u64) -> Self {
        Self { direction: AdjustDirection::Decrease, magnitude }
    }
}

impl PipelineConfig {
    /// Resources configured for a program, empty when none are set
    pub fn get_resources(&self, program: &str) -> ResourceConfig {
        self.resources.get(program).cloned().unwrap_or_default()
    }

    /// Resolve the location of a program from its resources.
    ///
    /// `Dir` requires an explicit `dir` entry. `Cmd` uses the configured
    /// `cmd` and otherwise looks the program name up on `PATH`.
    pub fn get_program(&self, program: &str, field: ProgramField) -> Result<PathBuf> {
        let resources = self.get_resources(program);
        match field {
            ProgramField::Dir => resources
                .dir
                .map(expand_path)
                .ok_or_else(|| BroadError::Config(format!("No dir configured for {}", program))),
            ProgramField::Cmd => {
                let cmd = resources.cmd.unwrap_or_else(|| program.to_string());
                if cmd.contains(std::path::MAIN_SEPARATOR) || cmd.starts_with('~') {
                    return Ok(expand_path(cmd));
                }
                which::which(&cmd).map_err(|_| {
                    BroadError::Config(format!("Could not find {} on PATH", cmd))
                })
            }
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<PipelineConfig> {
    toml::from_str(contents)
        .map_err(|e| BroadError::Config(format!("Failed to parse config: {}", e)))
}
