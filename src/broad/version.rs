//! GATK and Picard version detection.
//!
//! Starting a JVM just to ask for a version is slow, so the GATK version is
//! cached for the lifetime of a runner and can be pinned in the
//! configuration.

use std::cell::OnceCell;
use std::fmt;
use tracing::debug;

use crate::{BroadError, Result};

/// Banner line printed by GATK builds that predate the `-version` flag
const GATK_BANNER: &str = "The Genome Analysis Toolkit (GATK)";

/// Last GATK release shipped as GATK-lite
const LITE_MAX_VERSION: f64 = 2.3;

/// GATK distribution family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatkType {
    /// GATK-lite, 2.3 and earlier
    Lite,
    /// Restricted GATK, 2.4 onwards
    Restricted,
}

impl fmt::Display for GatkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatkType::Lite => write!(f, "lite"),
            GatkType::Restricted => write!(f, "restricted"),
        }
    }
}

/// Session cache in front of the configured and probed GATK version
#[derive(Debug, Default)]
pub struct VersionResolver {
    session: OnceCell<String>,
    configured: Option<String>,
}

impl VersionResolver {
    pub fn new(configured: Option<String>) -> Self {
        Self {
            session: OnceCell::new(),
            configured: configured.filter(|v| !v.is_empty()),
        }
    }

    /// Session value, then configured value, then `probe`.
    ///
    /// Only a probed value is stored in the session cache.
    pub fn resolve<F>(&self, probe: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(version) = self.session.get() {
            return Ok(version.clone());
        }
        if let Some(version) = &self.configured {
            return Ok(version.clone());
        }

        let version = probe()?;
        debug!("Detected GATK version {}", version);
        Ok(self.session.get_or_init(|| version).clone())
    }

    pub fn cached(&self) -> Option<&str> {
        self.session.get().map(String::as_str)
    }
}

/// Extract the version from the output of `GenomeAnalysisTK.jar -version`.
///
/// Builds before 2.4 have no version command and print an error along with a
/// banner carrying the version, e.g.
/// `The Genome Analysis Toolkit (GATK) v2.3-9-ge5ebf34, Compiled ...`.
pub fn parse_gatk_version(output: &str) -> Result<String> {
    let output = output.trim();
    let version = if output.contains("ERROR") {
        output
            .lines()
            .find_map(|line| line.strip_prefix(GATK_BANNER))
            .map(|rest| rest.split(',').next().unwrap_or(rest).trim())
            .ok_or_else(|| {
                BroadError::VersionParse(
                    "GATK reported an error without a version banner".to_string(),
                )
            })?
    } else {
        output
    };

    let version = version.strip_prefix('v').unwrap_or(version);
    if version.is_empty() {
        return Err(BroadError::VersionParse("empty GATK version output".to_string()));
    }
    Ok(version.to_string())
}

/// Classify a GATK version as lite or restricted.
///
/// Versions look like `2.4-9-g532efad`; anything not in that three part form
/// is an old build and treated as 2.3.
pub fn classify_distribution(version: &str) -> Result<GatkType> {
    let parts: Vec<&str> = version.split('-').collect();
    let number = match parts.as_slice() {
        [release, _, _] => {
            let release = release.strip_prefix('v').unwrap_or(release);
            release.parse::<f64>().map_err(|_| {
                BroadError::VersionParse(format!("Unexpected GATK version {}", version))
            })?
        }
        _ => LITE_MAX_VERSION,
    };

    if number > LITE_MAX_VERSION {
        Ok(GatkType::Restricted)
    } else {
        Ok(GatkType::Lite)
    }
}

/// Compare a version against a threshold as plain strings.
///
/// This is lexicographic, so `"1.10"` sorts below `"1.9"`. Callers rely on
/// that ordering; swap the body here for a semantic comparison if it ever
/// needs to change.
pub fn version_exceeds(version: &str, threshold: &str) -> bool {
    version > threshold
}

/// Parse `--version` output from Picard, e.g. `1.96(1534)`.
pub fn parse_picard_version(output: &str) -> Result<f64> {
    let head = output.split('(').next().unwrap_or_default().trim();
    head.parse::<f64>()
        .map_err(|_| BroadError::VersionParse(format!("Unexpected Picard version {:?}", output.trim())))
}
