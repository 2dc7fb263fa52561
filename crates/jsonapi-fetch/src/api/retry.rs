//! Bounded, immediate retry.
//!
//! Some backends cold-start slowly and answer the first requests with a 504
//! or similar. Every verb except POST retries a rejected response straight
//! away, up to [`DEFAULT_MAX_RETRIES`] times. There is no backoff and no
//! distinction between client and server errors: anything that is not
//! accepted is retried until the bound runs out.

use super::response::HttpResponse;

/// Retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries (0 = no retries, just fail immediately).
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryConfig {
    /// Create a config with the given number of retries.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
        }
    }

    /// Whether another attempt is allowed after `retry_count` retries.
    pub fn allows_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Upper bound on attempts for a retrying verb.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what to do with a response.
    pub fn decide(
        &self,
        policy: VerbPolicy,
        response: &HttpResponse,
        retry_count: u32,
    ) -> Outcome {
        if policy.acceptance.accepts(response) {
            Outcome::Resolve
        } else if policy.retries && self.allows_retry(retry_count) {
            Outcome::Retry
        } else {
            Outcome::Reject
        }
    }
}

/// When a response counts as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Not a 4xx/5xx and `ok`.
    NonErrorAndOk,
    /// Not a 4xx/5xx; `ok` is not consulted, so a 3xx resolves.
    NonError,
    /// `ok` alone.
    Ok,
}

impl Acceptance {
    pub fn accepts(self, response: &HttpResponse) -> bool {
        match self {
            Acceptance::NonErrorAndOk => !response.class().is_error() && response.ok(),
            Acceptance::NonError => !response.class().is_error(),
            Acceptance::Ok => response.ok(),
        }
    }
}

/// Acceptance rule plus whether rejected responses are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbPolicy {
    pub acceptance: Acceptance,
    pub retries: bool,
}

/// Next step of the attempt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Resolve,
    Retry,
    Reject,
}
