//! Command line assembly for GATK, MuTect and Picard.

use std::path::Path;
use tracing::debug;

use super::jvm::{context_jvm_opts, RuntimeContext};
use super::version::version_exceeds;
use crate::core::config::MemoryAdjust;
use crate::{BroadError, Result};

/// GATK walkers that parallelise with data threads (`-nt`); none currently do
const SUPPORTS_NT: &[&str] = &[];

/// GATK walkers that parallelise with CPU threads (`-nct`)
const SUPPORTS_NCT: &[&str] = &["BaseRecalibrator"];

/// GATK versions above this get lenient VCF processing and read filters
const SAFETY_FLAGS_THRESHOLD: &str = "1.9";

const SAFETY_READ_FILTERS: [&str; 2] = ["BadCigar", "NotPrimaryAlignment"];

/// Name of the GATK walker selected with `-T` or `--analysis_type`.
///
/// The short flag takes precedence when both are present.
pub fn analysis_type(params: &[String]) -> Option<&str> {
    let position = params
        .iter()
        .position(|p| p == "-T")
        .or_else(|| params.iter().position(|p| p == "--analysis_type"))?;
    params.get(position + 1).map(String::as_str)
}

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    jvm_opts: Vec<String>,
}

impl CommandBuilder {
    pub fn new(jvm_opts: Vec<String>) -> Self {
        Self { jvm_opts }
    }

    /// Full GATK command line.
    ///
    /// Adds thread flags when more than one core is configured, and the
    /// lenient processing flags for versions above 1.9.
    pub fn gatk(
        &self,
        jar: &Path,
        version: &str,
        context: &RuntimeContext,
        mut params: Vec<String>,
        tmp_dir: &Path,
    ) -> Result<Vec<String>> {
        let mut context = context.clone();
        let cores = context.core_count;

        if cores > 1 {
            let prog = analysis_type(&params)
                .ok_or_else(|| {
                    BroadError::InvalidInput("GATK parameters have no -T/--analysis_type".to_string())
                })?
                .to_string();

            if SUPPORTS_NT.contains(&prog.as_str()) {
                params.extend(["-nt".to_string(), cores.to_string()]);
            } else if SUPPORTS_NCT.contains(&prog.as_str()) {
                params.extend(["-nct".to_string(), cores.to_string()]);
                if context.memory_adjust.is_none() {
                    context.memory_adjust = Some(MemoryAdjust::increase(u64::from(cores / 2)));
                }
            }
        }

        if version_exceeds(version, SAFETY_FLAGS_THRESHOLD) {
            let has_unsafe = params
                .iter()
                .any(|p| p.starts_with("-U") || p.starts_with("--unsafe"));
            if !has_unsafe {
                params.extend(["-U".to_string(), "LENIENT_VCF_PROCESSING".to_string()]);
            }
            for filter in SAFETY_READ_FILTERS {
                params.extend(["--read_filter".to_string(), filter.to_string()]);
            }
        }

        self.java(jar, &context, tmp_dir, params)
    }

    /// MuTect command line: JVM options and temporary directory only.
    pub fn mutect(
        &self,
        jar: &Path,
        context: &RuntimeContext,
        params: Vec<String>,
        tmp_dir: &Path,
    ) -> Result<Vec<String>> {
        self.java(jar, context, tmp_dir, params)
    }

    /// Picard command line from a base command and `KEY=VALUE` options.
    pub fn picard(&self, base: Vec<String>, options: &[(String, String)]) -> Vec<String> {
        let mut cl = base;
        cl.extend(options.iter().map(|(key, value)| format!("{}={}", key, value)));
        cl.push("VALIDATION_STRINGENCY=SILENT".to_string());
        cl
    }

    /// Base Picard invocation for a jar, using the unscaled JVM options.
    pub fn picard_jar_base(&self, jar: &Path) -> Vec<String> {
        let mut cl = vec!["java".to_string()];
        cl.extend(self.jvm_opts.iter().cloned());
        cl.extend(["-jar".to_string(), jar.display().to_string()]);
        cl
    }

    fn java(
        &self,
        jar: &Path,
        context: &RuntimeContext,
        tmp_dir: &Path,
        params: Vec<String>,
    ) -> Result<Vec<String>> {
        let mut cl = vec!["java".to_string()];
        cl.extend(context_jvm_opts(&self.jvm_opts, context.memory_adjust.as_ref())?);
        cl.push(format!("-Djava.io.tmpdir={}", tmp_dir.display()));
        cl.extend(["-jar".to_string(), jar.display().to_string()]);
        cl.extend(params);
        debug!("Built command line: {}", cl.join(" "));
        Ok(cl)
    }
}

/// Minimal-heap JVM invocation used for version probes
pub fn version_probe(jar: &Path, flag: &str) -> Vec<String> {
    vec![
        "java".to_string(),
        "-Xms5m".to_string(),
        "-Xmx5m".to_string(),
        "-jar".to_string(),
        jar.display().to_string(),
        flag.to_string(),
    ]
}
