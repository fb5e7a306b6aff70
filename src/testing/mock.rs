//! Recording runner and scripted HTTP transport for tests

use std::cell::RefCell;
use std::collections::VecDeque;
use url::Url;

use crate::lims::HttpTransport;
use crate::process::{OutputCapture, ProcessRunner};
use crate::{BroadError, Result};

/// A command line handed to a [`RecordingRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Run { argv: Vec<String>, description: String },
    Spawn { argv: Vec<String> },
    Capture { argv: Vec<String>, capture: OutputCapture },
}

impl RecordedCall {
    pub fn argv(&self) -> &[String] {
        match self {
            RecordedCall::Run { argv, .. }
            | RecordedCall::Spawn { argv }
            | RecordedCall::Capture { argv, .. } => argv,
        }
    }
}

/// Records command lines instead of running them.
///
/// `capture` returns the queued outputs in order, then empty output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<RecordedCall>>,
    outputs: RefCell<VecDeque<Vec<u8>>>,
    fail_runs: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue output for the next `capture` call
    pub fn with_output(self, output: impl Into<Vec<u8>>) -> Self {
        self.outputs.borrow_mut().push_back(output.into());
        self
    }

    /// Make every synchronous run report a failed exit
    pub fn failing(mut self) -> Self {
        self.fail_runs = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn last_argv(&self) -> Option<Vec<String>> {
        self.calls.borrow().last().map(|c| c.argv().to_vec())
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, argv: &[String], description: &str) -> Result<()> {
        self.calls.borrow_mut().push(RecordedCall::Run {
            argv: argv.to_vec(),
            description: description.to_string(),
        });
        if self.fail_runs {
            return Err(BroadError::ExternalProcess {
                description: description.to_string(),
                status: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }

    fn spawn(&self, argv: &[String]) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(RecordedCall::Spawn { argv: argv.to_vec() });
        Ok(())
    }

    fn capture(&self, argv: &[String], capture: OutputCapture) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push(RecordedCall::Capture {
            argv: argv.to_vec(),
            capture,
        });
        Ok(self.outputs.borrow_mut().pop_front().unwrap_or_default())
    }
}

/// HTTP transport answering from a queue of response bodies.
///
/// Once the queue is empty every request fails with an HTTP error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<(Url, Option<String>)>>,
}

impl ScriptedTransport {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: RefCell::new(responses.iter().map(|r| r.to_string()).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Requested URLs with the POST body, if any
    pub fn requests(&self) -> Vec<(Url, Option<String>)> {
        self.requests.borrow().clone()
    }

    fn next(&self, url: &Url) -> Result<String> {
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| BroadError::Http(format!("no scripted response for {}", url)))
    }
}

impl HttpTransport for ScriptedTransport {
    fn get(&self, url: &Url) -> Result<String> {
        self.requests.borrow_mut().push((url.clone(), None));
        self.next(url)
    }

    fn post_json(&self, url: &Url, body: &str) -> Result<String> {
        self.requests
            .borrow_mut()
            .push((url.clone(), Some(body.to_string())));
        self.next(url)
    }
}
