//! Network layer used by the prober
//!
//! The [`Transport`] trait is the seam between probe logic and the wire:
//! [`HttpTransport`] sends real requests through reqwest, and tests substitute
//! scripted transports.

use crate::checker::classify::TransportError;
use crate::config::UserAgentConfig;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::{redirect::Policy, Client, Method};
use std::future::Future;
use std::time::Duration;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// HTTP method for one request within an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Head,
    Get,
}

impl RequestMethod {
    fn as_reqwest(self) -> Method {
        match self {
            Self::Head => Method::HEAD,
            Self::Get => Method::GET,
        }
    }
}

/// The parts of a response the prober looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// Final status code after redirects
    pub status: u16,

    /// Reason phrase for the status, if known
    pub reason: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: None,
        }
    }

    pub fn with_reason(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: Some(reason.into()),
        }
    }
}

/// Sends a single request and reports the final status
///
/// Implementations follow redirects and must not consult a response cache.
/// Deadlines are enforced by the caller, which drops the returned future when
/// an attempt times out.
pub trait Transport: Send + Sync + 'static {
    fn request(
        &self,
        method: RequestMethod,
        url: &str,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Builds an HTTP client for liveness probes
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use bookmark_audit::config::UserAgentConfig;
/// use bookmark_audit::checker::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a transport with a fresh client for the given user agent
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl Transport for HttpTransport {
    async fn request(
        &self,
        method: RequestMethod,
        url: &str,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .request(method.as_reqwest(), url)
            .send()
            .await?;

        let status = response.status();
        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
        })
    }
}
