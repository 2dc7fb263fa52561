//! Routing header derivation for request steering.
//!
//! When branching is switched on, each active [`RedirectRule`] becomes a
//! `route[<path>]=<destination>` entry in the `Routing` request header, so a
//! backend gateway can send matching traffic to an alternate variant (an A/B
//! branch, a tenant-specific deployment).
//!
//! The header is recomputed from the store on every attempt. Nothing here is
//! cached and nothing here fails: bad stored state yields an empty header.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::store::KeyValueStore;

/// Store key holding the on/off flag.
pub const BRANCHING_ENABLED_KEY: &str = "branchingEnabled";

/// Store key holding the JSON-encoded rule list.
pub const BRANCHING_RULES_KEY: &str = "branching";

/// Maps a source path fragment to a destination.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RedirectRule {
    pub path: String,
    pub destination: String,
}

impl RedirectRule {
    pub fn new(path: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            destination: destination.into(),
        }
    }

    /// A rule is active when neither field is blank after trimming.
    pub fn is_active(&self) -> bool {
        !self.path.trim().is_empty() && !self.destination.trim().is_empty()
    }

    /// Header entry for this rule. The stored values are used untrimmed.
    pub fn header_entry(&self) -> String {
        format!("route[{}]={}", self.path, self.destination)
    }
}

/// Which store keys hold the branching flag and rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingKeys {
    pub enabled: String,
    pub rules: String,
}

impl Default for RoutingKeys {
    fn default() -> Self {
        Self {
            enabled: BRANCHING_ENABLED_KEY.to_string(),
            rules: BRANCHING_RULES_KEY.to_string(),
        }
    }
}

/// Whether branching is switched on under the default key.
pub fn is_branching_enabled(store: &dyn KeyValueStore) -> bool {
    enabled_with_keys(store, &RoutingKeys::default())
}

/// Routing header value from the default keys.
pub fn compute_routing_header(store: &dyn KeyValueStore) -> String {
    routing_header_with_keys(store, &RoutingKeys::default())
}

/// Routing header value from custom keys. Empty when branching is off or no
/// rule is active.
pub fn routing_header_with_keys(store: &dyn KeyValueStore, keys: &RoutingKeys) -> String {
    if !enabled_with_keys(store, keys) {
        return String::new();
    }
    let rules = load_rules(store, &keys.rules);
    let header = format_rules(&rules);
    trace!("routing header: {header:?} ({} stored rule(s))", rules.len());
    header
}

/// Join the active rules, in order, with `;`.
pub fn format_rules(rules: &[RedirectRule]) -> String {
    rules
        .iter()
        .filter(|r| r.is_active())
        .map(RedirectRule::header_entry)
        .collect::<Vec<_>>()
        .join(";")
}

fn enabled_with_keys(store: &dyn KeyValueStore, keys: &RoutingKeys) -> bool {
    store
        .get_string(&keys.enabled)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn load_rules(store: &dyn KeyValueStore, key: &str) -> Vec<RedirectRule> {
    let Some(raw) = store.get_string(key) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(rules) => rules,
        Err(e) => {
            warn!("ignoring malformed routing rules under '{key}': {e}");
            Vec::new()
        }
    }
}
