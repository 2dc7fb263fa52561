//! JSON and JSON:API request helper with routing headers and bounded retries.
//!
//! `jsonapi-fetch` wraps a backend that speaks plain JSON and
//! [JSON:API](https://jsonapi.org/). Each call negotiates content types,
//! forwards a tenant partition, attaches a `Routing` header derived from
//! stored branching rules, and retries responses that look like a cold-start
//! failure. The core abstraction is [`FetchClient`](client::FetchClient).
//!
//! # Getting started
//!
//! ```ignore
//! use jsonapi_fetch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new()
//!         .with("branchingEnabled", "true")
//!         .with("branching", r#"[{"path":"/orders","destination":"orders-v2"}]"#);
//!     let client = FetchClient::new(store)?;
//!
//!     let opts = RequestOptions::new().partition("tenant-42");
//!     let orders = client.read_json_api("https://api.example.com/orders", &opts).await?;
//!     println!("{orders}");
//!
//!     match client.post_json_api(r#"{"data":{"type":"orders"}}"#, "https://api.example.com/orders", &opts).await {
//!         Ok(created) => println!("{created}"),
//!         Err(FetchError::Rejected(resp)) => eprintln!("HTTP {}: {}", resp.status(), resp.text()),
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Accept | Retries | `Data-Partition` | Ignore result |
//! |-----------|--------|--------|---------|------------------|---------------|
//! | [`read_json`](client::FetchClient::read_json) | GET | `application/json` | up to 5 | no | no |
//! | [`read_json_api`](client::FetchClient::read_json_api) | GET | `application/vnd.api+json` | up to 5 | yes | yes |
//! | [`patch_json_api`](client::FetchClient::patch_json_api) | PATCH | `application/vnd.api+json` | up to 5 | yes | yes |
//! | [`post_json_api`](client::FetchClient::post_json_api) | POST | `application/vnd.api+json` | never | yes | yes |
//! | [`delete_json_api`](client::FetchClient::delete_json_api) | DELETE | `application/vnd.api+json` | up to 5 | yes | yes |
//!
//! Retries are immediate. A rejected call returns
//! [`FetchError::Rejected`](error::FetchError::Rejected) carrying the last
//! response, so status, headers and body stay available to the caller.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`FetchClient`](client::FetchClient), per-call options, the attempt loop |
//! | [`api`] | Classification, retry policy, routing header, transport seam |
//! | [`store`] | [`KeyValueStore`](store::KeyValueStore) and its in-memory and file-backed implementations |
//! | [`error`] | [`FetchError`](error::FetchError) |

pub mod api;
pub mod client;
pub mod error;
pub mod prelude;
pub mod store;

pub use api::response::{HttpResponse, Payload};
pub use client::{ClientConfig, FetchClient, RequestOptions, Verb};
pub use error::FetchError;

// ── Constants ──────────────────────────────────────────────────────

/// Plain JSON media type.
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// JSON:API media type.
pub const MEDIA_TYPE_JSON_API: &str = "application/vnd.api+json";

/// Header carrying the caller's partition (tenant or namespace).
pub const DATA_PARTITION_HEADER: &str = "data-partition";

/// Header carrying the compiled routing rules.
pub const ROUTING_HEADER: &str = "routing";

pub const DEFAULT_USER_AGENT: &str = concat!("jsonapi-fetch/", env!("CARGO_PKG_VERSION"));
