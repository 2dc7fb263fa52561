//! Response classification shared by every verb.
//!
//! Two independent questions are answered here: does a status code count as
//! an error (client or server), and should a body be decoded as JSON or
//! handed back as text. Every entry point in [`client`](crate::client) asks
//! these questions through this module and nowhere else.

use crate::{MEDIA_TYPE_JSON, MEDIA_TYPE_JSON_API};

/// Content types whose bodies are decoded as JSON.
pub const JSON_TYPES: [&str; 2] = [MEDIA_TYPE_JSON_API, MEDIA_TYPE_JSON];

/// Error class of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 400–499.
    ClientError,
    /// 500–599.
    ServerError,
    /// Anything else, including 1xx and 3xx.
    NotError,
}

impl StatusClass {
    pub fn is_error(self) -> bool {
        !matches!(self, StatusClass::NotError)
    }
}

/// Classify a status code.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        400..=499 => StatusClass::ClientError,
        500..=599 => StatusClass::ServerError,
        _ => StatusClass::NotError,
    }
}

/// Whether a status code is a client or server error.
pub fn is_error_status(status: u16) -> bool {
    classify_status(status).is_error()
}

/// Whether a `Content-Type` value names one of the JSON media types.
///
/// The comparison is an exact, case-insensitive match: parameters such as
/// `; charset=utf-8` make the value count as text.
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| JSON_TYPES.iter().any(|t| ct.eq_ignore_ascii_case(t)))
}
