//! Convenience re-exports for common `jsonapi-fetch` types.
//!
//! Meant to be glob-imported by callers:
//!
//! ```ignore
//! use jsonapi_fetch::prelude::*;
//! ```
//!
//! Classification helpers and the retry policy types are left out; import
//! those from [`api`](crate::api) when needed.

// ── Client ──────────────────────────────────────────────────────────
pub use crate::client::{ClientConfig, FetchClient, RequestOptions};
pub use crate::error::FetchError;

// ── Responses ───────────────────────────────────────────────────────
pub use crate::api::response::{HttpResponse, Payload};

// ── Routing and stores ──────────────────────────────────────────────
pub use crate::api::router::{RedirectRule, RoutingKeys, compute_routing_header, is_branching_enabled};
pub use crate::store::{EmptyStore, JsonFileStore, KeyValueStore, MemoryStore};

// ── Transport ───────────────────────────────────────────────────────
pub use crate::api::transport::{ReqwestTransport, Transport, TransportRequest};
