//! Executing `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. The production
//! implementation uses a blocking ureq agent with status-as-error disabled,
//! so every HTTP answer (including 4xx/5xx) comes back as data and the
//! interceptors decide what it means. Failures where no answer arrived are
//! reported with a browser-style error code that the classifier inspects.

use std::io;
use std::time::Duration;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Largest response body read into memory. Exports and documents can be far
/// bigger than ureq's own 10 MB default.
pub const DEFAULT_BODY_LIMIT: u64 = 256 * 1024 * 1024;

/// Why no response was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request was sent (or attempted) but no response arrived.
    NoResponse { code: Option<String>, message: String },
    /// The request could not be issued at all.
    Setup(String),
    /// A response arrived but its body was larger than the transport accepts.
    BodyTooLarge { limit: u64 },
}

impl TransportError {
    pub fn no_response(code: Option<&str>, message: impl Into<String>) -> Self {
        TransportError::NoResponse {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }
}

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport built on a shared ureq agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.path.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), &request.headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &request.headers).call(),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url), &request.headers).send(body),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), &request.headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), &request.headers).send(body),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), &request.headers).send_empty(),
        };
        let mut response = result.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(|e| match e {
                ureq::Error::BodyExceedsLimit(_) => TransportError::BodyTooLarge { limit: self.body_limit },
                other => TransportError::no_response(None, other.to_string()),
            })?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Map ureq failures onto the codes a browser network stack would report.
fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(t) => TransportError::no_response(Some("ECONNABORTED"), format!("timeout: {t}")),
        ureq::Error::HostNotFound => TransportError::no_response(Some("ERR_NAME_NOT_RESOLVED"), "host not found"),
        ureq::Error::BadUri(msg) => TransportError::Setup(format!("invalid URL: {msg}")),
        ureq::Error::Io(e) if is_refused(&e) => {
            TransportError::no_response(Some("ERR_CONNECTION_REFUSED"), e.to_string())
        }
        other => {
            let message = other.to_string();
            let code = message.to_ascii_lowercase().contains("connection refused").then_some("ERR_CONNECTION_REFUSED");
            TransportError::no_response(code, message)
        }
    }
}

fn is_refused(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::ConnectionRefused || err.to_string().to_ascii_lowercase().contains("connection refused")
}
