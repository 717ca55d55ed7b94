//! Blocking HTTP transport used by grabbers. One GET at a time, no retries.

use crate::grabber::error::GrabberError;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = concat!("mangagrab/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;

/// Generic GET. Implementations return the response body as a readable stream;
/// the caller drops it once decoded.
pub trait Transport {
    fn get(&mut self, url: &str, referer: Option<&str>) -> Result<Box<dyn Read>, GrabberError>;
}

/// reqwest-backed transport.
#[derive(Debug)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Build a client with default User-Agent and timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    /// Builder for custom User-Agent and/or timeout.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }
}

impl Transport for HttpClient {
    fn get(&mut self, url: &str, referer: Option<&str>) -> Result<Box<dyn Read>, GrabberError> {
        debug!(url, referer = referer.unwrap_or(""), "GET");
        let mut request = self.inner.get(url);
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        let response = request.send().map_err(|e| GrabberError::Network {
            url: url.to_string(),
            source: e,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(GrabberError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(Box::new(response))
    }
}

/// Builder for HttpClient with optional User-Agent and timeout.
#[derive(Debug)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpClientBuilder {
    /// Set a custom User-Agent. If not set, `mangagrab/<version>` is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(HttpClient { inner })
    }
}
