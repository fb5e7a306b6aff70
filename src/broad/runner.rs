use std::path::{Path, PathBuf};
use tracing::debug;

use super::command::{analysis_type, version_probe, CommandBuilder};
use super::jvm::{RuntimeContext, DEFAULT_JVM_OPTS};
use super::locator::ToolLocator;
use super::picard::{PicardArgs, PicardFunction};
use super::version::{
    classify_distribution, parse_gatk_version, parse_picard_version, GatkType, VersionResolver,
};
use crate::core::config::{AlgorithmConfig, PipelineConfig, ResourceConfig};
use crate::core::paths::expand_path;
use crate::process::{with_tmp_dir, OutputCapture, ProcessRunner, RunMode, SystemRunner};
use crate::{BroadError, Result};

const GATK_JAR: &str = "GenomeAnalysisTK";
const GATK_LITE_JAR: &str = "GenomeAnalysisTKLite";
const MUTECT_JAR: &str = "muTect";

/// Tool locations and options fixed when a runner is created
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub picard_ref: PathBuf,
    pub gatk_dir: PathBuf,
    pub jvm_opts: Vec<String>,
    pub resources: ResourceConfig,
}

impl ToolConfig {
    /// `gatk_dir` falls back to `picard_ref` when not given
    pub fn new(picard_ref: &Path, gatk_dir: Option<&Path>, resources: ResourceConfig) -> Self {
        let picard_ref = expand_path(picard_ref);
        let gatk_dir = gatk_dir.map(expand_path).unwrap_or_else(|| picard_ref.clone());
        let jvm_opts = resources
            .jvm_opts
            .clone()
            .unwrap_or_else(|| DEFAULT_JVM_OPTS.iter().map(|s| s.to_string()).collect());
        Self { picard_ref, gatk_dir, jvm_opts, resources }
    }
}

/// Runs Picard, GATK and MuTect.
///
/// A runner caches the GATK version once it has been probed, so reuse one
/// runner per pipeline rather than creating one per call.
pub struct BroadRunner<R: ProcessRunner = SystemRunner> {
    tools: ToolConfig,
    algorithm: AlgorithmConfig,
    locator: ToolLocator,
    builder: CommandBuilder,
    versions: VersionResolver,
    process: R,
}

impl BroadRunner<SystemRunner> {
    pub fn new(picard_ref: &Path, gatk_dir: Option<&Path>, config: &PipelineConfig) -> Self {
        Self::with_runner(picard_ref, gatk_dir, config, SystemRunner::new())
    }
}

impl<R: ProcessRunner> BroadRunner<R> {
    pub fn with_runner(
        picard_ref: &Path,
        gatk_dir: Option<&Path>,
        config: &PipelineConfig,
        process: R,
    ) -> Self {
        let tools = ToolConfig::new(picard_ref, gatk_dir, config.get_resources("gatk"));
        let locator = ToolLocator::new(tools.gatk_dir.clone(), tools.picard_ref.clone());
        let builder = CommandBuilder::new(tools.jvm_opts.clone());
        let versions = VersionResolver::new(tools.resources.version.clone());
        Self {
            tools,
            algorithm: config.algorithm.clone(),
            locator,
            builder,
            versions,
            process,
        }
    }

    pub fn tool_config(&self) -> &ToolConfig {
        &self.tools
    }

    pub fn process(&self) -> &R {
        &self.process
    }

    /// Runtime settings for one invocation
    pub fn context(&self) -> RuntimeContext {
        RuntimeContext::from_algorithm(&self.algorithm)
    }

    fn gatk_jar(&self) -> Result<PathBuf> {
        self.locator.locate(GATK_JAR, &[GATK_LITE_JAR])
    }

    /// Installed GATK version, from the session cache, the configuration, or
    /// by asking GATK itself.
    pub fn get_gatk_version(&self) -> Result<String> {
        self.versions.resolve(|| {
            let jar = self.gatk_jar()?;
            let output = self
                .process
                .capture(&version_probe(&jar, "-version"), OutputCapture::Combined)?;
            parse_gatk_version(&String::from_utf8_lossy(&output))
        })
    }

    /// Whether the installed GATK is the lite (2.3) or restricted (2.4+) build
    pub fn gatk_type(&self) -> Result<GatkType> {
        classify_distribution(&self.get_gatk_version()?)
    }

    pub fn cl_gatk<I>(&self, params: I, tmp_dir: &Path) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let jar = self.gatk_jar()?;
        let version = self.get_gatk_version()?;
        let params = params.into_iter().map(|p| p.to_string()).collect();
        self.builder.gatk(&jar, &version, &self.context(), params, tmp_dir)
    }

    pub fn cl_mutect<I>(&self, params: I, tmp_dir: &Path) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let jar = self.locator.locate(MUTECT_JAR, &[])?;
        let params = params.into_iter().map(|p| p.to_string()).collect();
        self.builder.mutect(&jar, &self.context(), params, tmp_dir)
    }

    /// Run GATK, in `tmp_dir` or a scratch directory removed afterwards
    pub fn run_gatk<I>(&self, params: I, tmp_dir: Option<&Path>) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let params: Vec<String> = params.into_iter().map(|p| p.to_string()).collect();
        with_tmp_dir(tmp_dir, |tmp| {
            let cl = self.cl_gatk(params, tmp)?;
            let prog = analysis_type(&cl).ok_or_else(|| {
                BroadError::InvalidInput("GATK parameters have no -T/--analysis_type".to_string())
            })?;
            self.process.run(&cl, &format!("GATK: {}", prog))
        })
    }

    /// Run the MuTect paired tumor/normal caller
    pub fn run_mutect<I>(&self, params: I, tmp_dir: Option<&Path>) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let params: Vec<String> = params.into_iter().map(|p| p.to_string()).collect();
        with_tmp_dir(tmp_dir, |tmp| {
            let cl = self.cl_mutect(params, tmp)?;
            self.process.run(&cl, "MuTect: MuTect")
        })
    }

    fn picard_is_dir(&self) -> bool {
        self.tools.picard_ref.is_dir()
    }

    /// Base Picard command, either a jar from a directory of jars or the
    /// `picard-tools` style wrapper script.
    ///
    /// JVM options cannot be passed through the wrapper script.
    pub fn picard_cmd(&self, command: &str) -> Result<Vec<String>> {
        if self.picard_is_dir() {
            let jar = self.locator.locate(command, &[])?;
            Ok(self.builder.picard_jar_base(&jar))
        } else {
            Ok(vec![
                self.tools.picard_ref.display().to_string(),
                command.to_string(),
            ])
        }
    }

    pub fn cl_picard(&self, command: &str, options: &[(String, String)]) -> Result<Vec<String>> {
        let base = self.picard_cmd(command)?;
        Ok(self.builder.picard(base, options))
    }

    /// Run a Picard command with `KEY=VALUE` options.
    ///
    /// Returns the captured stdout for [`RunMode::CaptureStdout`].
    pub fn run(
        &self,
        command: &str,
        options: &[(String, String)],
        mode: RunMode,
    ) -> Result<Option<Vec<u8>>> {
        let cl = self.cl_picard(command, options)?;
        self.process.execute(&cl, &format!("Picard {}", command), mode)
    }

    /// Version reported by a Picard command, e.g. `1.96`
    pub fn get_picard_version(&self, command: &str) -> Result<f64> {
        let cl = if self.picard_is_dir() {
            version_probe(&self.locator.locate(command, &[])?, "--version")
        } else {
            vec![
                self.tools.picard_ref.display().to_string(),
                command.to_string(),
                "--version".to_string(),
            ]
        };
        let output = self.process.capture(&cl, OutputCapture::Combined)?;
        let version = parse_picard_version(&String::from_utf8_lossy(&output))?;
        debug!("Picard {} version {}", command, version);
        Ok(version)
    }

    /// Run a pre-built Picard operation by name, e.g. `picard_sort`
    pub fn run_fn(&self, name: &str, args: &PicardArgs) -> Result<PathBuf> {
        let function: PicardFunction = name.parse()?;
        function.call(self, args)
    }
}
