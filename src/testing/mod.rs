//! Test doubles for the process and HTTP seams

pub mod mock;

pub use mock::{RecordedCall, RecordingRunner, ScriptedTransport};
