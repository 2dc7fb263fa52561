//! Captured transport responses and resolved payloads.

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;

use super::classify::{StatusClass, classify_status, is_json_content_type};

/// A response as returned by a [`Transport`](super::transport::Transport).
///
/// The body is read in full before the response reaches the retry loop, so a
/// rejected response still carries everything the backend sent.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl HttpResponse {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Transport-level success flag: status in 200–299.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn class(&self) -> StatusClass {
        classify_status(self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup. Values that are not valid UTF-8 read
    /// as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Whether the body should be decoded as JSON.
    pub fn is_json(&self) -> bool {
        is_json_content_type(self.content_type())
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// The value a successful request resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded body of a JSON response, or the empty-object stand-in when the
    /// caller asked to ignore the result.
    Json(serde_json::Value),
    /// Body of any non-JSON response.
    Text(String),
}

impl Payload {
    /// The `{}` stand-in returned in place of an ignored JSON body.
    pub fn empty_object() -> Self {
        Payload::Json(serde_json::Value::Object(serde_json::Map::new()))
    }

    pub fn is_empty_object(&self) -> bool {
        matches!(self, Payload::Json(serde_json::Value::Object(map)) if map.is_empty())
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Json(_) => None,
        }
    }

    /// Deserialize into a caller type. Text payloads are parsed as JSON.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            Payload::Json(value) => serde_json::from_value(value),
            Payload::Text(text) => serde_json::from_str(&text),
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Json(value) => write!(f, "{value}"),
            Payload::Text(text) => f.write_str(text),
        }
    }
}
