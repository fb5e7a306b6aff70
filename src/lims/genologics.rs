//! Genologics LIMS access through a vendor session.

use serde_json::Value;

use super::LimsApi;
use crate::{BroadError, Result};

/// Handle to a connected Genologics LIMS session.
///
/// The session comes from the vendor SDK and is owned by the caller; this
/// crate only talks to it through these calls.
#[cfg_attr(test, mockall::automock)]
pub trait GenologicsSession {
    /// Confirm the server speaks a supported API version
    fn check_version(&self) -> Result<()>;

    fn get_projects(&self) -> Result<Value>;
}

/// Access to the commercial Genologics LIMS
pub struct GenologicsApiAccess<S: GenologicsSession> {
    session: S,
}

impl<S: GenologicsSession> GenologicsApiAccess<S> {
    pub fn new(session: S) -> Result<Self> {
        session.check_version()?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

impl<S: GenologicsSession> LimsApi for GenologicsApiAccess<S> {
    // TODO: translate Genologics run records into the next-gen LIMS run
    // details layout.
    fn run_details(&self, run_bc: &str, _run_date: Option<&str>) -> Result<Value> {
        Err(BroadError::NotImplemented(format!(
            "Genologics run details for {}",
            run_bc
        )))
    }

    fn sequencing_projects(&self) -> Result<Value> {
        self.session.get_projects()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connected() -> MockGenologicsSession {
        let mut session = MockGenologicsSession::new();
        session.expect_check_version().times(1).returning(|| Ok(()));
        session
    }

    #[test]
    fn test_construction_checks_version() {
        let mut session = MockGenologicsSession::new();
        session
            .expect_check_version()
            .times(1)
            .returning(|| Err(BroadError::Http("unsupported API v1".to_string())));
        assert!(GenologicsApiAccess::new(session).is_err());
    }

    #[test]
    fn test_run_details_not_implemented() {
        // No get_projects expectation: any call into the session would panic.
        let lims = GenologicsApiAccess::new(connected()).unwrap();
        match lims.run_details("RUN123", Some("2020-01-01")) {
            Err(BroadError::NotImplemented(msg)) => assert!(msg.contains("RUN123")),
            other => panic!("Expected NotImplemented, got {:?}", other),
        }
    }

    #[test]
    fn test_projects_delegate_to_session() {
        let mut session = connected();
        session
            .expect_get_projects()
            .times(1)
            .returning(|| Ok(json!([{"name": "Exome_2020"}])));

        let lims = GenologicsApiAccess::new(session).unwrap();
        assert_eq!(
            lims.sequencing_projects().unwrap(),
            json!([{"name": "Exome_2020"}])
        );
    }
}
