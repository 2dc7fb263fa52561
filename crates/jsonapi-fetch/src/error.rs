//! Error type returned by every [`FetchClient`](crate::client::FetchClient) operation.

use crate::api::response::HttpResponse;

/// Why a request did not resolve to a [`Payload`](crate::api::response::Payload).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The backend answered, but the answer was not accepted and no retries
    /// remain. Carries the last response so callers can inspect status,
    /// headers and body.
    #[error("request rejected with HTTP {}", .0.status())]
    Rejected(HttpResponse),

    /// The transport produced no response at all (connection refused, DNS
    /// failure, transport-level timeout). Not retried.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response was labelled as JSON but its body did not parse.
    #[error("failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A header value could not be encoded for the wire.
    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl FetchError {
    /// The rejected response, if this error carries one.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            FetchError::Rejected(response) => Some(response),
            _ => None,
        }
    }

    /// HTTP status of the rejected response, if any.
    pub fn status(&self) -> Option<u16> {
        self.response().map(HttpResponse::status)
    }
}
