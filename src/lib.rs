//! Run Broad Institute command line tools and talk to sequencing LIMS.
//!
//! The [`broad`] module locates Picard, GATK and MuTect jars, works out
//! which GATK build is installed and assembles the java command lines to run
//! them. The [`lims`] module is a small JSON REST client for the Galaxy
//! next-gen LIMS, with a stub for the Genologics LIMS.

pub mod broad;
pub mod cli;
pub mod core;
pub mod lims;
pub mod process;
pub mod testing;

pub use crate::broad::{runner_from_config, BroadRunner, GatkType, PicardFunction};
pub use crate::core::config::{load_config, PipelineConfig};
pub use crate::lims::{ApiAccess, ApiSession, GalaxyApiAccess, GenologicsApiAccess, LimsApi};
pub use crate::process::{ProcessRunner, RunMode, SystemRunner};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BroadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find jar {name} in {picard_ref}:{gatk_dir}")]
    ToolNotFound {
        name: String,
        picard_ref: PathBuf,
        gatk_dir: PathBuf,
    },

    #[error("Version parse error: {0}")]
    VersionParse(String),

    #[error("{description} failed with {status}")]
    ExternalProcess { description: String, status: String },

    #[error("Could not decode API response: {0}")]
    ApiDecode(#[from] serde_json::Error),

    #[error("{0}")]
    LimsLookup(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, BroadError>;

impl From<reqwest::Error> for BroadError {
    fn from(err: reqwest::Error) -> Self {
        BroadError::Http(err.to_string())
    }
}

impl From<url::ParseError> for BroadError {
    fn from(err: url::ParseError) -> Self {
        BroadError::Http(format!("invalid URL: {}", err))
    }
}
