//! Request plumbing: classification, retry, routing headers, and transport.
//!
//! - [`classify`]: status error classes and JSON content-type detection,
//!   shared by every verb.
//! - [`retry`]: immediate bounded retry and the per-verb acceptance rules.
//! - [`router`]: the `Routing` header built from stored [`RedirectRule`]s.
//! - [`response`]: the captured [`HttpResponse`] and resolved [`Payload`].
//! - [`transport`]: the [`Transport`] seam and its reqwest implementation.

pub mod classify;
pub mod response;
pub mod retry;
pub mod router;
pub mod transport;

// Re-export commonly used items at the module level.
pub use classify::{StatusClass, classify_status, is_error_status, is_json_content_type};
pub use response::{HttpResponse, Payload};
pub use retry::RetryConfig;
pub use router::{RedirectRule, RoutingKeys, compute_routing_header, is_branching_enabled};
pub use transport::{ReqwestTransport, Transport, TransportFuture, TransportRequest};
