//! Generic JSON REST access shared by the LIMS clients.

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::Result;

/// Retries after the first attempt when a GET response is not valid JSON
pub const DEFAULT_MAX_RETRIES: u32 = 5;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Connection settings shared by every call from one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSession {
    pub base_url: String,
    pub api_key: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl ApiSession {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Raw HTTP access returning response bodies as text
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport {
    fn get(&self, url: &Url) -> Result<String>;

    fn post_json(&self, url: &Url, body: &str) -> Result<String>;
}

/// Blocking reqwest transport.
///
/// No request timeout is configured, so a stalled server blocks the caller
/// indefinitely.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send()?.error_for_status()?;
        Ok(response.text()?)
    }

    fn post_json(&self, url: &Url, body: &str) -> Result<String> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }
}

/// Base REST client: keyed URLs, JSON decoding and GET retries
pub struct ApiAccess<T: HttpTransport = ReqwestTransport> {
    session: ApiSession,
    transport: T,
}

impl ApiAccess<ReqwestTransport> {
    pub fn new(session: ApiSession) -> Result<Self> {
        Ok(Self::with_transport(session, ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> ApiAccess<T> {
    pub fn with_transport(session: ApiSession, transport: T) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &ApiSession {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `<base_url><rel_url>` with the parameters and API key URL-encoded.
    ///
    /// The session key replaces any `key` the caller passes.
    pub fn make_url(&self, rel_url: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.session.base_url, rel_url))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied().filter(|(k, _)| *k != "key"))
            .append_pair("key", &self.session.api_key);
        Ok(url)
    }

    /// GET a JSON document.
    ///
    /// Bodies that fail to decode are fetched again, up to `max_retries`
    /// times with `retry_delay` between attempts. Transport errors are not
    /// retried.
    pub fn get(&self, rel_url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.make_url(rel_url, params)?;
        let mut retries = 0;
        loop {
            debug!("GET {}", rel_url);
            let body = self.transport.get(&url)?;
            match serde_json::from_str(&body) {
                Ok(value) => return Ok(value),
                Err(e) if retries >= self.session.max_retries => return Err(e.into()),
                Err(e) => {
                    retries += 1;
                    warn!(
                        "Invalid JSON from {} ({}), retry {}/{}",
                        rel_url, e, retries, self.session.max_retries
                    );
                    thread::sleep(self.session.retry_delay);
                }
            }
        }
    }

    /// POST a JSON body in a single attempt.
    ///
    /// With `need_return` unset an undecodable response becomes `{}`.
    pub fn post<B: Serialize + ?Sized>(
        &self,
        rel_url: &str,
        data: &B,
        params: &[(&str, &str)],
        need_return: bool,
    ) -> Result<Value> {
        let url = self.make_url(rel_url, params)?;
        let body = serde_json::to_string(data)?;
        debug!("POST {}", rel_url);
        let response = self.transport.post_json(&url, &body)?;
        match serde_json::from_str(&response) {
            Ok(value) => Ok(value),
            Err(_) if !need_return => Ok(Value::Object(Default::default())),
            Err(e) => Err(e.into()),
        }
    }
}
