//! Access LIMS functionality through its REST APIs.
//!
//! Two LIMS are supported behind [`LimsApi`]: the next-gen LIMS running
//! inside Galaxy, reached over HTTP, and the commercial Genologics LIMS,
//! reached through a caller-supplied vendor session.

pub mod client;
pub mod galaxy;
pub mod genologics;

pub use client::{ApiAccess, ApiSession, HttpTransport, ReqwestTransport};
pub use galaxy::GalaxyApiAccess;
pub use genologics::{GenologicsApiAccess, GenologicsSession};

use serde_json::Value;

use crate::Result;

/// Operations common to every LIMS backend
pub trait LimsApi {
    /// Run details the pipeline can use, looked up by barcode with an
    /// optional run date to fall back on.
    fn run_details(&self, run_bc: &str, run_date: Option<&str>) -> Result<Value>;

    /// Summary information on sequencing projects
    fn sequencing_projects(&self) -> Result<Value>;
}
