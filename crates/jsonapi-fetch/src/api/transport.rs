//! The wire seam: one request in, one fully-read response out.

use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use reqwest::Method;
use reqwest::header::HeaderMap;
use tracing::{debug, trace};

use super::response::HttpResponse;

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> = BoxFuture<'a, Result<HttpResponse, String>>;

/// A single outgoing request. Built fresh for every attempt.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Sends requests and reads responses.
///
/// `Err` means no response was obtained at all. Any HTTP status, including
/// 4xx and 5xx, comes back as `Ok`. Uses a boxed future so that the trait is
/// dyn-compatible.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// [`Transport`] over a `reqwest::Client` with a cookie store, so cookies
/// set by the backend ride along on later requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the default user agent and no timeout.
    pub fn new() -> Result<Self, String> {
        Self::with_options(crate::DEFAULT_USER_AGENT, None)
    }

    /// Build a transport with a custom user agent and optional per-request
    /// timeout.
    pub fn with_options(user_agent: &str, timeout: Option<Duration>) -> Result<Self, String> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self { client })
    }

    /// Wrap an existing client, e.g. one carrying extra middleware settings.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let TransportRequest {
                method,
                url,
                headers,
                body,
            } = request;
            trace!(
                "{method} {url}: {} header(s), body {} bytes",
                headers.len(),
                body.as_ref().map_or(0, |b| b.len())
            );

            let start = Instant::now();
            let mut builder = self.client.request(method.clone(), &url).headers(headers);
            if let Some(body) = body {
                builder = builder.body(body);
            }
            let resp = builder
                .send()
                .await
                .map_err(|e| format!("{method} {url}: {e}"))?;

            let status = resp.status().as_u16();
            let headers = resp.headers().clone();
            let text = resp
                .text()
                .await
                .map_err(|e| format!("failed to read response: {e}"))?;

            debug!(
                "{method} {url}: HTTP {status} in {:.1}s ({} bytes)",
                start.elapsed().as_secs_f64(),
                text.len()
            );
            Ok(HttpResponse::new(status, headers, text))
        })
    }
}
