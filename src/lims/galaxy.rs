//! Client for the next-gen LIMS API served from Galaxy.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::client::{ApiAccess, ApiSession, HttpTransport, ReqwestTransport};
use super::LimsApi;
use crate::{BroadError, Result};

const RUN_DETAILS: &str = "/nglims/api_run_details";
const PROJECTS: &str = "/nglims/api_projects";
const UPLOAD_RUN_SUMMARY: &str = "/nglims/api_upload_sqn_run_summary";
const SQN_REPORT: &str = "/nglims/api_sqn_report";

/// Front end for the next-gen LIMS API hosted in Galaxy
pub struct GalaxyApiAccess<T: HttpTransport = ReqwestTransport> {
    api: ApiAccess<T>,
}

impl GalaxyApiAccess<ReqwestTransport> {
    pub fn new(galaxy_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self::from_api(ApiAccess::new(ApiSession::new(galaxy_url, api_key))?))
    }
}

impl<T: HttpTransport> GalaxyApiAccess<T> {
    pub fn from_api(api: ApiAccess<T>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiAccess<T> {
        &self.api
    }

    fn lookup_run(&self, run: &str) -> Result<Value> {
        self.api
            .get(RUN_DETAILS, &[("run", run)])
            .map_err(|e| match e {
                BroadError::ApiDecode(_) => BroadError::LimsLookup(format!(
                    "Could not find information in Galaxy for run: {}",
                    run
                )),
                other => other,
            })
    }

    /// Upload sequencing run summary information
    pub fn sqn_run_summary<B: Serialize + ?Sized>(&self, run_info: &B) -> Result<Value> {
        self.api.post(UPLOAD_RUN_SUMMARY, run_info, &[], true)
    }

    /// Report of items sequenced between two dates
    pub fn sqn_report(&self, start_date: &str, end_date: &str) -> Result<Value> {
        self.api
            .get(SQN_REPORT, &[("start", start_date), ("end", end_date)])
    }
}

impl<T: HttpTransport> LimsApi for GalaxyApiAccess<T> {
    /// Look up a run by barcode, retrying by run date when the LIMS reports
    /// an error for the barcode.
    fn run_details(&self, run_bc: &str, run_date: Option<&str>) -> Result<Value> {
        let mut details = self.lookup_run(run_bc)?;
        let mut queried = vec![run_bc];

        if details.get("error").is_some() {
            if let Some(run_date) = run_date {
                info!("Run {} not found in Galaxy, retrying with {}", run_bc, run_date);
                details = self.lookup_run(run_date)?;
                queried.push(run_date);
            }
        }

        if let Some(error) = details.get("error") {
            return Err(BroadError::LimsLookup(format!(
                "Could not find information in Galaxy for run: {} ({})",
                queried.join(", "),
                error
            )));
        }
        Ok(details)
    }

    fn sequencing_projects(&self) -> Result<Value> {
        self.api.get(PROJECTS, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lims::client::MockHttpTransport;
    use crate::testing::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    fn session() -> ApiSession {
        ApiSession::new("http://galaxy.example.org", "abc123").with_retry_delay(Duration::ZERO)
    }

    fn galaxy(transport: MockHttpTransport) -> GalaxyApiAccess<MockHttpTransport> {
        GalaxyApiAccess::from_api(ApiAccess::with_transport(session(), transport))
    }

    fn query_has(url: &url::Url, key: &str, value: &str) -> bool {
        url.query_pairs().any(|(k, v)| k == key && v == value)
    }

    #[test]
    fn test_run_details_found() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url| url.path() == RUN_DETAILS && query_has(url, "run", "RUN123"))
            .times(1)
            .returning(|_| Ok(r#"{"run_name": "RUN123", "lanes": []}"#.to_string()));

        let details = galaxy(transport).run_details("RUN123", None).unwrap();
        assert_eq!(details["run_name"], "RUN123");
    }

    #[test]
    fn test_run_details_falls_back_to_run_date() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url| query_has(url, "run", "RUN123"))
            .times(1)
            .returning(|_| Ok(r#"{"error": "not found"}"#.to_string()));
        transport
            .expect_get()
            .withf(|url| query_has(url, "run", "2020-01-01") && query_has(url, "key", "abc123"))
            .times(1)
            .returning(|_| Ok(r#"{"run_name": "200101_SN1_0001", "lanes": [1]}"#.to_string()));

        let details = galaxy(transport)
            .run_details("RUN123", Some("2020-01-01"))
            .unwrap();
        assert_eq!(details, json!({"run_name": "200101_SN1_0001", "lanes": [1]}));
    }

    #[test]
    fn test_run_details_error_without_fallback() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Ok(r#"{"error": "not found"}"#.to_string()));

        match galaxy(transport).run_details("RUN123", None) {
            Err(BroadError::LimsLookup(msg)) => assert!(msg.contains("RUN123")),
            other => panic!("Expected LimsLookup error, got {:?}", other),
        }
    }

    #[test]
    fn test_run_details_error_after_fallback_names_both() {
        let transport = ScriptedTransport::new(&[r#"{"error": "no"}"#, r#"{"error": "no"}"#]);
        let galaxy = GalaxyApiAccess::from_api(ApiAccess::with_transport(session(), transport));

        match galaxy.run_details("RUN9", Some("2021-06-30")) {
            Err(BroadError::LimsLookup(msg)) => {
                assert!(msg.contains("RUN9"));
                assert!(msg.contains("2021-06-30"));
            }
            other => panic!("Expected LimsLookup error, got {:?}", other),
        }
    }

    #[test]
    fn test_run_details_undecodable_is_lookup_failure() {
        let transport = ScriptedTransport::new(&["<html>"; 6]);
        let galaxy = GalaxyApiAccess::from_api(ApiAccess::with_transport(session(), transport));

        match galaxy.run_details("RUN404", None) {
            Err(BroadError::LimsLookup(msg)) => {
                assert_eq!(msg, "Could not find information in Galaxy for run: RUN404")
            }
            other => panic!("Expected LimsLookup error, got {:?}", other),
        }
    }

    #[test]
    fn test_sequencing_projects() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url| url.path() == PROJECTS)
            .times(1)
            .returning(|_| Ok(r#"[{"name": "P1"}]"#.to_string()));

        let projects = galaxy(transport).sequencing_projects().unwrap();
        assert_eq!(projects, json!([{"name": "P1"}]));
    }

    #[test]
    fn test_sqn_report_params() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url| {
                url.path() == SQN_REPORT
                    && query_has(url, "start", "2020-01-01")
                    && query_has(url, "end", "2020-03-31")
            })
            .times(1)
            .returning(|_| Ok(r#"{"items": []}"#.to_string()));

        let report = galaxy(transport).sqn_report("2020-01-01", "2020-03-31").unwrap();
        assert_eq!(report, json!({"items": []}));
    }

    #[test]
    fn test_sqn_run_summary_requires_json_reply() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_post_json()
            .withf(|url, _| url.path() == UPLOAD_RUN_SUMMARY)
            .times(1)
            .returning(|_, _| Ok("OK".to_string()));

        let result = galaxy(transport).sqn_run_summary(&json!({"run": "RUN1"}));
        assert!(matches!(result, Err(BroadError::ApiDecode(_))));
    }
}
