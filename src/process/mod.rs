//! Execution of assembled command lines.
//!
//! Everything here is a single blocking subprocess call, or a single
//! detached launch. Parallelism of the tools themselves is controlled by
//! their own command line flags.

use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, error, info, warn};

use crate::{BroadError, Result};

/// How a command line should be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Block until exit, non-zero exit is an error
    Synchronous,
    /// Launch and return immediately
    Background,
    /// Block until exit and hand back stdout, exit status is not checked
    CaptureStdout,
}

/// Which output streams `capture` collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCapture {
    Stdout,
    /// stdout followed by stderr
    Combined,
}

pub trait ProcessRunner {
    /// Run to completion, failing on a non-zero exit status
    fn run(&self, argv: &[String], description: &str) -> Result<()>;

    /// Launch without waiting.
    ///
    /// No handle is returned, so the child is never reaped by this layer and
    /// lingers until the parent process exits.
    fn spawn(&self, argv: &[String]) -> Result<()>;

    /// Run to completion and return the captured output. The caller is
    /// responsible for interpreting failures.
    fn capture(&self, argv: &[String], capture: OutputCapture) -> Result<Vec<u8>>;

    fn execute(&self, argv: &[String], description: &str, mode: RunMode) -> Result<Option<Vec<u8>>> {
        match mode {
            RunMode::Synchronous => self.run(argv, description).map(|_| None),
            RunMode::Background => self.spawn(argv).map(|_| None),
            RunMode::CaptureStdout => self.capture(argv, OutputCapture::Stdout).map(Some),
        }
    }
}

/// Runs commands as real subprocesses
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }

    fn command(argv: &[String]) -> Result<Command> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BroadError::InvalidInput("empty command line".to_string()))?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        Ok(cmd)
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String], description: &str) -> Result<()> {
        let mut cmd = Self::command(argv)?;
        info!("{}", description);
        debug!(command = %command_line(argv), "executing");

        let status = cmd.status()?;
        if !status.success() {
            error!(command = %command_line(argv), "{} failed: {}", description, status);
            return Err(BroadError::ExternalProcess {
                description: description.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn spawn(&self, argv: &[String]) -> Result<()> {
        let mut cmd = Self::command(argv)?;
        debug!(command = %command_line(argv), "launching in background");
        cmd.spawn()?;
        Ok(())
    }

    fn capture(&self, argv: &[String], capture: OutputCapture) -> Result<Vec<u8>> {
        let mut cmd = Self::command(argv)?;
        cmd.stdin(Stdio::null());
        debug!(command = %command_line(argv), "capturing output");

        let output = cmd.output()?;
        if !output.status.success() {
            debug!("{} exited with {}", argv[0], output.status);
        }

        let mut bytes = output.stdout;
        if capture == OutputCapture::Combined {
            bytes.extend_from_slice(&output.stderr);
        }
        Ok(bytes)
    }
}

/// Join an argv into a single line for logging
pub fn command_line(argv: &[String]) -> String {
    argv.join(" ")
}

/// Run `f` with a temporary directory.
///
/// An explicit directory is passed straight through. Otherwise a fresh
/// directory is created under the current working directory and removed once
/// `f` returns, whether it succeeded or not.
pub fn with_tmp_dir<T, F>(explicit: Option<&Path>, f: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    if let Some(dir) = explicit {
        return f(dir);
    }

    let cwd = std::env::current_dir()?;
    let tmp = tempfile::Builder::new().prefix("tmp").tempdir_in(&cwd)?;
    let result = f(tmp.path());
    let path = tmp.path().to_path_buf();
    if let Err(e) = tmp.close() {
        warn!("Failed to remove temporary directory {}: {}", path.display(), e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_argv_rejected() {
        let runner = SystemRunner::new();
        assert!(matches!(
            runner.run(&[], "nothing"),
            Err(BroadError::InvalidInput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_success_and_failure() {
        let runner = SystemRunner::new();
        assert!(runner.run(&argv(&["true"]), "true").is_ok());

        match runner.run(&argv(&["false"]), "Picard SortSam") {
            Err(BroadError::ExternalProcess { description, .. }) => {
                assert_eq!(description, "Picard SortSam");
            }
            other => panic!("Expected ExternalProcess error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_ignores_exit_status() {
        let runner = SystemRunner::new();
        let out = runner
            .capture(&argv(&["sh", "-c", "echo hello; exit 3"]), OutputCapture::Stdout)
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_combined() {
        let runner = SystemRunner::new();
        let out = runner
            .capture(
                &argv(&["sh", "-c", "echo out; echo err 1>&2"]),
                OutputCapture::Combined,
            )
            .unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_modes() {
        let runner = SystemRunner::new();
        let cmd = argv(&["echo", "mode"]);
        assert_eq!(runner.execute(&cmd, "echo", RunMode::Synchronous).unwrap(), None);
        assert_eq!(runner.execute(&cmd, "echo", RunMode::Background).unwrap(), None);
        let out = runner.execute(&cmd, "echo", RunMode::CaptureStdout).unwrap().unwrap();
        assert_eq!(out, b"mode\n");
    }

    #[test]
    fn test_explicit_tmp_dir_passed_through() {
        let explicit = PathBuf::from("/scratch/job1");
        let seen = with_tmp_dir(Some(&explicit), |dir| Ok(dir.to_path_buf())).unwrap();
        assert_eq!(seen, explicit);
    }

    #[test]
    fn test_implicit_tmp_dir_removed() {
        let seen = with_tmp_dir(None, |dir| {
            assert!(dir.is_dir());
            Ok(dir.to_path_buf())
        })
        .unwrap();
        assert!(!seen.exists());
    }

    #[test]
    fn test_implicit_tmp_dir_removed_on_error() {
        let mut seen = PathBuf::new();
        let result: Result<()> = with_tmp_dir(None, |dir| {
            seen = dir.to_path_buf();
            Err(BroadError::InvalidInput("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(!seen.as_os_str().is_empty());
        assert!(!seen.exists());
    }
}
