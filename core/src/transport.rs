//! Executing `HttpRequest` values against the network.
//!
//! # Design
//! The core never performs I/O on its own. `Transport` is the seam where a
//! host plugs in the actual round-trip; tests plug in scripted fakes.
//! `UreqTransport` is the blocking implementation used by the web host and
//! the integration tests. Non-2xx statuses come back as data so the client's
//! parsers stay the single place where status codes are interpreted.

use tracing::debug;

use crate::error::TransportError;
use crate::http::{CredentialsMode, HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// Requests with `CredentialsMode::Include` share one agent, so cookies set
/// by the backend travel with later requests. `Omit` requests get a fresh
/// agent each time.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    shared: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            shared: new_agent(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Disables ureq's status-code-as-error behavior so 4xx/5xx responses are
/// returned as data rather than `Err`.
fn new_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent()
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let fresh;
        let agent = match request.credentials {
            CredentialsMode::Include => &self.shared,
            CredentialsMode::Omit => {
                fresh = new_agent();
                &fresh
            }
        };

        debug!(method = request.method.as_str(), url = %request.path, "executing request");

        let url = request.path.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.unwrap_or_default();
        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), headers).call(),
            HttpMethod::Post => with_headers(agent.post(url), headers).send(body.as_bytes()),
            HttpMethod::Put => with_headers(agent.put(url), headers).send(body.as_bytes()),
        };
        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
