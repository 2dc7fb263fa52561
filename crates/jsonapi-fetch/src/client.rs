//! The request executor and its five public operations.
//!
//! Every operation runs the same attempt loop:
//!
//! ```text
//! Attempt ──accepted──▶ Success (Payload)
//!    │
//!    ├──rejected, retries left──▶ Attempt (headers rebuilt)
//!    │
//!    └──rejected, no retries left──▶ Fail (FetchError::Rejected(response))
//! ```
//!
//! What differs per verb is captured by [`Verb`]: method, `Accept`, whether
//! `Content-Type` and `Data-Partition` are sent, and the [`VerbPolicy`] that
//! decides acceptance and retry. POST never retries: without idempotency keys
//! a second attempt could create the resource twice.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::api::response::{HttpResponse, Payload};
use crate::api::retry::{Acceptance, Outcome, RetryConfig, VerbPolicy};
use crate::api::router::{RoutingKeys, routing_header_with_keys};
use crate::api::transport::{ReqwestTransport, Transport, TransportRequest};
use crate::error::FetchError;
use crate::store::KeyValueStore;
use crate::{
    DATA_PARTITION_HEADER, DEFAULT_USER_AGENT, MEDIA_TYPE_JSON, MEDIA_TYPE_JSON_API,
    ROUTING_HEADER,
};

/// Client-wide settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retry bound for GET, PATCH and DELETE. Default: 5 retries.
    pub retry: RetryConfig,
    /// User agent for the built-in transport.
    pub user_agent: String,
    /// Per-request timeout for the built-in transport. Default: none.
    pub timeout: Option<Duration>,
    /// Store keys for the branching flag and rules.
    pub routing: RoutingKeys,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            routing: RoutingKeys::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(retries);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_routing_keys(mut self, keys: RoutingKeys) -> Self {
        self.routing = keys;
        self
    }
}

/// Per-call options for the JSON:API operations.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Sent as `Data-Partition`; absent means an empty header.
    pub partition: Option<String>,
    /// Resolve JSON responses to `{}` instead of decoding the body.
    pub ignore_return: bool,
    /// Retries already consumed. Ignored by POST.
    pub retry_count: u32,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn ignore_return(mut self, ignore: bool) -> Self {
        self.ignore_return = ignore;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

/// The operation being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    ReadJson,
    ReadJsonApi,
    PatchJsonApi,
    PostJsonApi,
    DeleteJsonApi,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::ReadJson | Verb::ReadJsonApi => Method::GET,
            Verb::PatchJsonApi => Method::PATCH,
            Verb::PostJsonApi => Method::POST,
            Verb::DeleteJsonApi => Method::DELETE,
        }
    }

    pub fn accept(self) -> &'static str {
        match self {
            Verb::ReadJson => MEDIA_TYPE_JSON,
            _ => MEDIA_TYPE_JSON_API,
        }
    }

    /// Mutating verbs declare a JSON:API request body.
    pub fn sends_content_type(self) -> bool {
        matches!(
            self,
            Verb::PatchJsonApi | Verb::PostJsonApi | Verb::DeleteJsonApi
        )
    }

    pub fn sends_partition(self) -> bool {
        !matches!(self, Verb::ReadJson)
    }

    pub fn policy(self) -> VerbPolicy {
        match self {
            Verb::ReadJson | Verb::ReadJsonApi | Verb::PatchJsonApi => VerbPolicy {
                acceptance: Acceptance::NonErrorAndOk,
                retries: true,
            },
            Verb::DeleteJsonApi => VerbPolicy {
                acceptance: Acceptance::NonError,
                retries: true,
            },
            Verb::PostJsonApi => VerbPolicy {
                acceptance: Acceptance::Ok,
                retries: false,
            },
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verb::ReadJson => write!(f, "read_json"),
            Verb::ReadJsonApi => write!(f, "read_json_api"),
            Verb::PatchJsonApi => write!(f, "patch_json_api"),
            Verb::PostJsonApi => write!(f, "post_json_api"),
            Verb::DeleteJsonApi => write!(f, "delete_json_api"),
        }
    }
}

type HeaderSeed<'a> = &'a (dyn Fn() -> HeaderMap + Send + Sync);

/// Issues JSON and JSON:API requests with routing headers and bounded retry.
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn KeyValueStore>,
    config: ClientConfig,
}

impl FetchClient {
    /// Client over the built-in reqwest transport with default settings.
    pub fn new(store: impl KeyValueStore + 'static) -> Result<Self, String> {
        Self::with_config(store, ClientConfig::default())
    }

    /// Client over the built-in reqwest transport.
    pub fn with_config(
        store: impl KeyValueStore + 'static,
        config: ClientConfig,
    ) -> Result<Self, String> {
        let transport = ReqwestTransport::with_options(&config.user_agent, config.timeout)?;
        Ok(Self::with_transport(Arc::new(transport), store, config))
    }

    /// Client over any transport.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        store: impl KeyValueStore + 'static,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            store: Arc::new(store),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The `Routing` header value the next attempt would carry.
    pub fn routing_header(&self) -> String {
        routing_header_with_keys(&*self.store, &self.config.routing)
    }

    /// GET accepting plain JSON. Retries.
    pub async fn read_json(&self, url: &str) -> Result<Payload, FetchError> {
        self.execute(Verb::ReadJson, url, None, &RequestOptions::default(), None)
            .await
    }

    /// GET accepting JSON:API. Retries.
    pub async fn read_json_api(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Payload, FetchError> {
        self.execute(Verb::ReadJsonApi, url, None, options, None)
            .await
    }

    /// PATCH a JSON:API resource. Retries.
    pub async fn patch_json_api(
        &self,
        resource: &str,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Payload, FetchError> {
        self.execute(Verb::PatchJsonApi, url, Some(resource), options, None)
            .await
    }

    /// POST a JSON:API resource. Never retries; any non-2xx rejects.
    pub async fn post_json_api(
        &self,
        resource: &str,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Payload, FetchError> {
        self.execute(Verb::PostJsonApi, url, Some(resource), options, None)
            .await
    }

    /// POST with headers seeded by `headers`. The standard headers are set
    /// afterwards and replace any seeded value with the same name.
    pub async fn post_json_api_with_headers<F>(
        &self,
        resource: &str,
        url: &str,
        options: &RequestOptions,
        headers: F,
    ) -> Result<Payload, FetchError>
    where
        F: Fn() -> HeaderMap + Send + Sync,
    {
        self.execute(
            Verb::PostJsonApi,
            url,
            Some(resource),
            options,
            Some(&headers as HeaderSeed<'_>),
        )
        .await
    }

    /// DELETE a JSON:API resource. Retries; resolves on any non-error
    /// status, 2xx or not.
    pub async fn delete_json_api(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Payload, FetchError> {
        self.execute(Verb::DeleteJsonApi, url, None, options, None)
            .await
    }

    async fn execute(
        &self,
        verb: Verb,
        url: &str,
        body: Option<&str>,
        options: &RequestOptions,
        seed: Option<HeaderSeed<'_>>,
    ) -> Result<Payload, FetchError> {
        let policy = verb.policy();
        let ignore_return = options.ignore_return && verb != Verb::ReadJson;
        let mut retry_count = if policy.retries {
            options.retry_count
        } else {
            0
        };

        loop {
            let headers = self.build_headers(verb, options.partition.as_deref(), seed)?;
            debug!("{verb} {url}: attempt with retry count {retry_count}");
            let request = TransportRequest {
                method: verb.method(),
                url: url.to_string(),
                headers,
                body: body.map(str::to_string),
            };
            let response = self
                .transport
                .send(request)
                .await
                .map_err(FetchError::Transport)?;

            match self.config.retry.decide(policy, &response, retry_count) {
                Outcome::Resolve => return resolve(response, ignore_return),
                Outcome::Retry => {
                    retry_count = retry_count.saturating_add(1);
                    warn!(
                        "{verb} {url}: HTTP {}, retry {retry_count}/{}",
                        response.status(),
                        self.config.retry.max_retries
                    );
                }
                Outcome::Reject => {
                    if policy.retries {
                        warn!(
                            "{verb} {url}: HTTP {} after {retry_count} retries, giving up",
                            response.status()
                        );
                    } else {
                        debug!("{verb} {url}: HTTP {}, rejected", response.status());
                    }
                    return Err(FetchError::Rejected(response));
                }
            }
        }
    }

    fn build_headers(
        &self,
        verb: Verb,
        partition: Option<&str>,
        seed: Option<HeaderSeed<'_>>,
    ) -> Result<HeaderMap, FetchError> {
        let mut headers = seed.map(|f| f()).unwrap_or_default();
        headers.insert(ACCEPT, HeaderValue::from_static(verb.accept()));
        if verb.sends_content_type() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE_JSON_API));
        }
        if verb.sends_partition() {
            headers.insert(
                HeaderName::from_static(DATA_PARTITION_HEADER),
                header_value(DATA_PARTITION_HEADER, partition.unwrap_or(""))?,
            );
        }
        headers.insert(
            HeaderName::from_static(ROUTING_HEADER),
            header_value(ROUTING_HEADER, &self.routing_header())?,
        );
        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Turn an accepted response into the resolved value. Text bodies are
/// returned even when the caller asked to ignore the result.
fn resolve(response: HttpResponse, ignore_return: bool) -> Result<Payload, FetchError> {
    if !response.is_json() {
        return Ok(Payload::Text(response.into_body()));
    }
    if ignore_return {
        return Ok(Payload::empty_object());
    }
    Ok(Payload::Json(response.json()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router::{BRANCHING_ENABLED_KEY, BRANCHING_RULES_KEY};
    use crate::api::transport::TransportFuture;
    use crate::store::{EmptyStore, MemoryStore};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type SendHook = Box<dyn Fn(usize) + Send + Sync>;

    /// Plays back canned responses and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HttpResponse, String>>>,
        sent: Mutex<Vec<TransportRequest>>,
        on_send: Option<SendHook>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<HttpResponse, String>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                ..Default::default()
            })
        }

        fn with_hook(script: Vec<Result<HttpResponse, String>>, hook: SendHook) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                on_send: Some(hook),
                ..Default::default()
            })
        }

        fn sent(&self) -> Vec<TransportRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
            let index = {
                let mut sent = self.sent.lock().unwrap();
                sent.push(request);
                sent.len()
            };
            if let Some(hook) = &self.on_send {
                hook(index);
            }
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".into()));
            Box::pin(async move { next })
        }
    }

    fn resp(status: u16, content_type: Option<&str>, body: &str) -> Result<HttpResponse, String> {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(ct).unwrap());
        }
        Ok(HttpResponse::new(status, headers, body))
    }

    fn failing(status: u16, n: usize) -> Vec<Result<HttpResponse, String>> {
        (1..=n)
            .map(|i| resp(status, Some("text/plain"), &format!("attempt {i}")))
            .collect()
    }

    fn client(transport: Arc<ScriptedTransport>) -> FetchClient {
        FetchClient::with_transport(transport, EmptyStore, ClientConfig::default())
    }

    fn header<'a>(req: &'a TransportRequest, name: &str) -> Option<&'a str> {
        req.headers.get(name).and_then(|v| v.to_str().ok())
    }

    // ── Resolution ──────────────────────────────────────────────────

    #[tokio::test]
    async fn json_body_is_decoded() {
        let transport = ScriptedTransport::new(vec![resp(200, Some("application/json"), r#"{"a":1}"#)]);
        let payload = client(transport).read_json("http://x/a").await.unwrap();
        assert_eq!(payload, Payload::Json(serde_json::json!({"a": 1})));
    }

    #[tokio::test]
    async fn text_body_is_returned_as_text() {
        let transport = ScriptedTransport::new(vec![resp(200, Some("text/plain"), "ok")]);
        let payload = client(transport).read_json("http://x/a").await.unwrap();
        assert_eq!(payload, Payload::Text("ok".into()));
    }

    #[tokio::test]
    async fn json_api_content_type_is_decoded() {
        let transport = ScriptedTransport::new(vec![resp(
            200,
            Some("Application/VND.API+JSON"),
            r#"{"data":[]}"#,
        )]);
        let payload = client(transport)
            .read_json_api("http://x/a", &RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(payload, Payload::Json(serde_json::json!({"data": []})));
    }

    #[tokio::test]
    async fn ignore_return_yields_empty_object_for_json() {
        let transport = ScriptedTransport::new(vec![
            resp(200, Some("application/vnd.api+json"), r#"{"data":{"id":"1"}}"#),
            resp(200, Some("application/vnd.api+json"), "not even json"),
        ]);
        let c = client(transport);
        let opts = RequestOptions::new().ignore_return(true);
        assert!(c.read_json_api("http://x", &opts).await.unwrap().is_empty_object());
        assert!(c.patch_json_api("{}", "http://x", &opts).await.unwrap().is_empty_object());
    }

    #[tokio::test]
    async fn ignore_return_still_returns_text() {
        let transport = ScriptedTransport::new(vec![resp(200, Some("text/plain"), "done")]);
        let opts = RequestOptions::new().ignore_return(true);
        let payload = client(transport).delete_json_api("http://x", &opts).await.unwrap();
        assert_eq!(payload, Payload::Text("done".into()));
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let transport = ScriptedTransport::new(vec![resp(200, Some("application/json"), "{oops")]);
        let err = client(transport.clone()).read_json("http://x").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert_eq!(transport.sent().len(), 1);
    }

    // ── Retry ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn five_server_errors_then_success_resolves() {
        for verb in [Verb::ReadJson, Verb::ReadJsonApi, Verb::PatchJsonApi, Verb::DeleteJsonApi] {
            let mut script = failing(503, 5);
            script.push(resp(200, Some("application/json"), r#"{"ok":true}"#));
            let transport = ScriptedTransport::new(script);
            let c = client(transport.clone());
            let opts = RequestOptions::new();
            let payload = c
                .execute(verb, "http://x", Some("{}").filter(|_| verb == Verb::PatchJsonApi), &opts, None)
                .await
                .unwrap();
            assert_eq!(payload, Payload::Json(serde_json::json!({"ok": true})), "{verb}");
            assert_eq!(transport.sent().len(), 6, "{verb}");
        }
    }

    #[tokio::test]
    async fn six_server_errors_reject_with_sixth_response() {
        for verb in [Verb::ReadJson, Verb::ReadJsonApi, Verb::PatchJsonApi, Verb::DeleteJsonApi] {
            let mut script = failing(504, 6);
            script.push(resp(200, Some("text/plain"), "never reached"));
            let transport = ScriptedTransport::new(script);
            let err = client(transport.clone())
                .execute(verb, "http://x", None, &RequestOptions::new(), None)
                .await
                .unwrap_err();
            let FetchError::Rejected(response) = err else {
                panic!("{verb}: expected rejection, got {err:?}");
            };
            assert_eq!(response.status(), 504);
            assert_eq!(response.text(), "attempt 6", "{verb}");
            assert_eq!(transport.sent().len(), 6, "{verb}");
        }
    }

    #[tokio::test]
    async fn client_errors_are_retried_too() {
        let mut script = failing(404, 2);
        script.push(resp(200, Some("text/plain"), "found"));
        let transport = ScriptedTransport::new(script);
        let payload = client(transport.clone()).read_json("http://x").await.unwrap();
        assert_eq!(payload.as_text(), Some("found"));
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn post_never_retries() {
        let transport = ScriptedTransport::new(vec![
            resp(503, Some("text/plain"), "unavailable"),
            resp(201, Some("application/vnd.api+json"), "{}"),
        ]);
        let err = client(transport.clone())
            .post_json_api("{}", "http://x", &RequestOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn post_resolves_on_ok() {
        let transport = ScriptedTransport::new(vec![resp(
            201,
            Some("application/vnd.api+json"),
            r#"{"data":{"id":"9"}}"#,
        )]);
        let payload = client(transport)
            .post_json_api(r#"{"data":{}}"#, "http://x", &RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(payload.as_json().unwrap()["data"]["id"], "9");
    }

    #[tokio::test]
    async fn not_modified_resolves_for_delete_but_retries_for_get() {
        let transport = ScriptedTransport::new(vec![resp(304, None, "")]);
        let payload = client(transport.clone())
            .delete_json_api("http://x", &RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(payload, Payload::Text(String::new()));
        assert_eq!(transport.sent().len(), 1);

        let mut script = vec![resp(304, None, "")];
        script.push(resp(200, None, "fresh"));
        let transport = ScriptedTransport::new(script);
        let payload = client(transport.clone())
            .read_json_api("http://x", &RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(payload.as_text(), Some("fresh"));
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn seeded_retry_count_shortens_chain() {
        let transport = ScriptedTransport::new(failing(500, 3));
        let opts = RequestOptions::new().with_retry_count(4);
        let err = client(transport.clone())
            .read_json_api("http://x", &opts)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn configured_bound_is_respected() {
        let transport = ScriptedTransport::new(failing(500, 5));
        let c = FetchClient::with_transport(
            transport.clone(),
            EmptyStore,
            ClientConfig::default().with_max_retries(2),
        );
        assert!(c.read_json("http://x").await.is_err());
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Err("connection refused".into())]);
        let err = client(transport.clone()).read_json("http://x").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(ref m) if m == "connection refused"));
        assert_eq!(transport.sent().len(), 1);
    }

    // ── Headers ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn read_json_headers() {
        let transport = ScriptedTransport::new(vec![resp(200, None, "")]);
        client(transport.clone()).read_json("http://x/plain").await.unwrap();
        let req = &transport.sent()[0];
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url, "http://x/plain");
        assert_eq!(header(req, "accept"), Some("application/json"));
        assert_eq!(header(req, "routing"), Some(""));
        assert!(req.headers.get("content-type").is_none());
        assert!(req.headers.get("data-partition").is_none());
        assert!(req.body.is_none());
    }

    #[tokio::test]
    async fn api_headers_per_verb() {
        let transport = ScriptedTransport::new(vec![
            resp(200, None, ""),
            resp(200, None, ""),
            resp(200, None, ""),
            resp(200, None, ""),
        ]);
        let c = client(transport.clone());
        let opts = RequestOptions::new().partition("tenant-7");
        c.read_json_api("http://x", &opts).await.unwrap();
        c.patch_json_api("patch-body", "http://x", &opts).await.unwrap();
        c.post_json_api("post-body", "http://x", &opts).await.unwrap();
        c.delete_json_api("http://x", &RequestOptions::new()).await.unwrap();

        let sent = transport.sent();
        let methods: Vec<Method> = sent.iter().map(|r| r.method.clone()).collect();
        assert_eq!(methods, vec![Method::GET, Method::PATCH, Method::POST, Method::DELETE]);
        for req in &sent {
            assert_eq!(header(req, "accept"), Some("application/vnd.api+json"));
        }
        assert!(sent[0].headers.get("content-type").is_none());
        for req in &sent[1..] {
            assert_eq!(header(req, "content-type"), Some("application/vnd.api+json"));
        }
        assert_eq!(header(&sent[0], "data-partition"), Some("tenant-7"));
        assert_eq!(header(&sent[2], "data-partition"), Some("tenant-7"));
        assert_eq!(header(&sent[3], "data-partition"), Some(""));

        assert!(sent[0].body.is_none());
        assert_eq!(sent[1].body.as_deref(), Some("patch-body"));
        assert_eq!(sent[2].body.as_deref(), Some("post-body"));
        assert!(sent[3].body.is_none());
    }

    #[tokio::test]
    async fn post_header_seed_loses_to_standard_headers() {
        let transport = ScriptedTransport::new(vec![resp(201, None, "")]);
        let seed = || {
            let mut h = HeaderMap::new();
            h.insert("x-csrf-token", HeaderValue::from_static("abc"));
            h.insert(ACCEPT, HeaderValue::from_static("text/html"));
            h.insert("data-partition", HeaderValue::from_static("seeded"));
            h
        };
        client(transport.clone())
            .post_json_api_with_headers("{}", "http://x", &RequestOptions::new().partition("p1"), seed)
            .await
            .unwrap();
        let req = &transport.sent()[0];
        assert_eq!(header(req, "x-csrf-token"), Some("abc"));
        assert_eq!(header(req, "accept"), Some("application/vnd.api+json"));
        assert_eq!(header(req, "data-partition"), Some("p1"));
        assert_eq!(req.headers.get_all("accept").iter().count(), 1);
    }

    #[tokio::test]
    async fn routing_header_comes_from_store() {
        let store = MemoryStore::new()
            .with(BRANCHING_ENABLED_KEY, "true")
            .with(BRANCHING_RULES_KEY, r#"[{"path":"/api","destination":"canary"}]"#);
        let transport = ScriptedTransport::new(vec![resp(200, None, "")]);
        let c = FetchClient::with_transport(transport.clone(), store, ClientConfig::default());
        assert_eq!(c.routing_header(), "route[/api]=canary");
        c.read_json("http://x").await.unwrap();
        assert_eq!(header(&transport.sent()[0], "routing"), Some("route[/api]=canary"));
    }

    #[tokio::test]
    async fn routing_header_is_recomputed_per_attempt() {
        let store = Arc::new(MemoryStore::new().with(
            BRANCHING_RULES_KEY,
            r#"[{"path":"/api","destination":"canary"}]"#,
        ));
        let hook_store = store.clone();
        let mut script = failing(502, 1);
        script.push(resp(200, None, ""));
        let transport = ScriptedTransport::with_hook(
            script,
            Box::new(move |n| {
                if n == 1 {
                    hook_store.set(BRANCHING_ENABLED_KEY, "true");
                }
            }),
        );
        let c = FetchClient::with_transport(transport.clone(), store, ClientConfig::default());
        c.read_json("http://x").await.unwrap();

        let sent = transport.sent();
        assert_eq!(header(&sent[0], "routing"), Some(""));
        assert_eq!(header(&sent[1], "routing"), Some("route[/api]=canary"));
    }

    #[tokio::test]
    async fn invalid_partition_fails_before_sending() {
        let transport = ScriptedTransport::new(vec![resp(200, None, "")]);
        let err = client(transport.clone())
            .read_json_api("http://x", &RequestOptions::new().partition("bad\nvalue"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidHeader { ref name, .. } if name == "data-partition"));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn verb_policies() {
        assert!(Verb::ReadJson.policy().retries);
        assert!(Verb::DeleteJsonApi.policy().retries);
        assert!(!Verb::PostJsonApi.policy().retries);
        assert_eq!(Verb::DeleteJsonApi.policy().acceptance, Acceptance::NonError);
        assert_eq!(Verb::PatchJsonApi.policy(), Verb::ReadJsonApi.policy());
    }
}
