// ── Solprobe Engine: HTTP Transport with Retry ─────────────────────────────
//
// One outbound call with timeout, retry on transient status, fixed backoff.
//
//   • Retry on 429 and any 5xx, sleeping the next slot of the RetryPolicy
//   • Attempts per call are bounded by the policy length
//   • Connection-level failures (DNS, refused, timeout) are never retried here
//   • Non-transient responses (2xx, 3xx, other 4xx) are returned unchanged
//
// The retry loop is generic over the attempt and sleep functions so the
// sleep schedule can be observed without a network.

use crate::atoms::constants::DEFAULT_BACKOFF_MS;
use crate::atoms::error::{EngineResult, TransportError};
use crate::engine::helpers::redact_url;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::future::Future;
use std::time::Duration;

// ── Retryable status detection ─────────────────────────────────────────────

/// Check if an HTTP status code represents a transient/retryable error.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

// ── Retry policy ───────────────────────────────────────────────────────────

/// Ordered backoff slots. Slot `i` is slept after a transient failure on
/// attempt `i`; a failure on the last slot is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// An empty list is treated as a single attempt.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().map(|ms| Duration::from_millis(*ms)).collect())
    }

    /// One attempt, no retries.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len().max(1)
    }

    /// Delay before retrying after `attempt` failed, or None when exhausted.
    pub fn delay_after(&self, attempt: usize) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts() {
            return None;
        }
        self.delays.get(attempt).copied()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&DEFAULT_BACKOFF_MS)
    }
}

// ── Request / response values ──────────────────────────────────────────────

/// A single attempt of one call; exists only inside `send_with_retry`.
#[derive(Debug, Clone)]
pub struct RequestAttempt<'a> {
    pub method: &'a Method,
    pub target: &'a str,
    /// Zero-based attempt index, which is also its backoff slot.
    pub slot: usize,
}

/// Everything needed to issue one call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self { method: Method::POST, body: Some(body), ..Self::get(url) }
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> EngineResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ── Retry driver ───────────────────────────────────────────────────────────

/// Issue `attempt` until it yields a non-transient response or the policy is
/// exhausted. A connection-level error from `attempt` returns immediately.
pub async fn send_with_retry<A, AFut, S, SFut>(
    policy: &RetryPolicy,
    method: &Method,
    target: &str,
    mut attempt: A,
    mut sleep: S,
) -> Result<HttpResponse, TransportError>
where
    A: FnMut(RequestAttempt<'_>) -> AFut,
    AFut: Future<Output = Result<HttpResponse, TransportError>>,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut slot = 0;
    loop {
        let resp = attempt(RequestAttempt { method, target, slot }).await?;
        if !is_retryable_status(resp.status) {
            return Ok(resp);
        }
        match policy.delay_after(slot) {
            Some(delay) => {
                warn!(
                    "[http] {} {} returned {}, retry {}/{} after {}ms",
                    method, target, resp.status, slot + 1, policy.max_attempts() - 1, delay.as_millis()
                );
                sleep(delay).await;
                slot += 1;
            }
            None => {
                warn!("[http] {} {} returned {}, retries exhausted", method, target, resp.status);
                return Err(TransportError::from_status(resp.status, target, &resp.body));
            }
        }
    }
}

// ── Transport ──────────────────────────────────────────────────────────────

/// Shared HTTP transport. Cheap to clone (reqwest pools connections).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    policy: RetryPolicy,
    default_timeout: Duration,
}

impl HttpTransport {
    pub fn new(policy: RetryPolicy, default_timeout: Duration) -> EngineResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::from_reqwest("client", e))?;
        Ok(Self { client, policy, default_timeout })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Same connection pool, different retry schedule for one call site.
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self { policy, ..self.clone() }
    }

    /// Issue a call with retry. Non-transient responses come back as-is.
    pub async fn send(&self, spec: &RequestSpec) -> Result<HttpResponse, TransportError> {
        let target = redact_url(&spec.url);
        send_with_retry(
            &self.policy,
            &spec.method,
            &target,
            |attempt| self.attempt_once(spec, attempt.target.to_string(), attempt.slot),
            tokio::time::sleep,
        )
        .await
    }

    async fn attempt_once(
        &self,
        spec: &RequestSpec,
        target: String,
        slot: usize,
    ) -> Result<HttpResponse, TransportError> {
        debug!("[http] {} {} (attempt {})", spec.method, target, slot + 1);
        let mut req = self
            .client
            .request(spec.method.clone(), &spec.url)
            .timeout(spec.timeout.unwrap_or(self.default_timeout));
        if !spec.query.is_empty() {
            req = req.query(&spec.query);
        }
        for (name, value) in &spec.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &spec.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| TransportError::from_reqwest(&target, e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| TransportError::from_reqwest(&target, e))?;
        Ok(HttpResponse { status, body })
    }

    /// Send and require 2xx, decoding the JSON body.
    pub async fn send_json(&self, spec: &RequestSpec) -> EngineResult<serde_json::Value> {
        let resp = self.send(spec).await?;
        if !resp.is_success() {
            return Err(TransportError::from_status(resp.status, &redact_url(&spec.url), &resp.body).into());
        }
        resp.json()
    }

    pub async fn get_json(&self, url: &str, query: Vec<(String, String)>) -> EngineResult<serde_json::Value> {
        self.send_json(&RequestSpec::get(url).query(query)).await
    }

    pub async fn post_json(&self, url: &str, body: serde_json::Value) -> EngineResult<serde_json::Value> {
        self.send_json(&RequestSpec::post(url, body)).await
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use parking_lot::Mutex;

    fn scripted(statuses: &[u16]) -> Arc<Mutex<VecDeque<u16>>> {
        Arc::new(Mutex::new(statuses.iter().copied().collect()))
    }

    async fn run(
        policy: &RetryPolicy,
        statuses: &[u16],
    ) -> (Result<HttpResponse, TransportError>, usize, Vec<Duration>) {
        let script = scripted(statuses);
        let calls = Arc::new(Mutex::new(0usize));
        let sleeps = Arc::new(Mutex::new(Vec::new()));
        let result = send_with_retry(
            policy,
            &reqwest::Method::GET,
            "http://stub",
            |_attempt| {
                let script = script.clone();
                let calls = calls.clone();
                async move {
                    *calls.lock() += 1;
                    let status = script.lock().pop_front().unwrap_or(200);
                    Ok(HttpResponse { status, body: format!("status {}", status) })
                }
            },
            |d| {
                let sleeps = sleeps.clone();
                async move { sleeps.lock().push(d) }
            },
        )
        .await;
        let calls = *calls.lock();
        let sleeps = sleeps.lock().clone();
        (result, calls, sleeps)
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(599));
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
    }

    #[test]
    fn policy_slots() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts(), 3);
        assert_eq!(p.delay_after(0), Some(Duration::from_millis(200)));
        assert_eq!(p.delay_after(1), Some(Duration::from_millis(600)));
        assert_eq!(p.delay_after(2), None);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
        assert_eq!(RetryPolicy::none().delay_after(0), None);
    }

    #[tokio::test]
    async fn transient_then_success_sleeps_twice() {
        let (result, calls, sleeps) = run(&RetryPolicy::default(), &[500, 429, 200]).await;
        let resp = result.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(calls, 3);
        assert_eq!(sleeps, vec![Duration::from_millis(200), Duration::from_millis(600)]);
    }

    #[tokio::test]
    async fn persistent_server_error_surfaces_without_extra_retry() {
        let (result, calls, sleeps) = run(&RetryPolicy::default(), &[500, 500, 500, 500]).await;
        match result {
            Err(TransportError::HttpServerError { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(calls, 3);
        assert_eq!(sleeps.len(), 2);
    }

    #[tokio::test]
    async fn client_error_is_returned_unchanged() {
        let (result, calls, sleeps) = run(&RetryPolicy::default(), &[404]).await;
        assert_eq!(result.unwrap().status, 404);
        assert_eq!(calls, 1);
        assert!(sleeps.is_empty());
    }

    #[tokio::test]
    async fn exhausted_rate_limit_is_client_error() {
        let (result, _, _) = run(&RetryPolicy::from_millis(&[1, 1]), &[429, 429]).await;
        assert!(matches!(result, Err(TransportError::HttpClientError { status: 429, .. })));
    }

    #[tokio::test]
    async fn connection_failure_is_not_retried() {
        let calls = Arc::new(Mutex::new(0usize));
        let result = send_with_retry(
            &RetryPolicy::default(),
            &reqwest::Method::GET,
            "http://stub",
            |attempt| {
                let calls = calls.clone();
                let target = attempt.target.to_string();
                async move {
                    *calls.lock() += 1;
                    Err(TransportError::ConnectionFailed { target, message: "refused".into() })
                }
            },
            |_| async {},
        )
        .await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed { .. })));
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn transport_reads_json_from_server() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/rpc").header("content-type", "application/json");
                then.status(200).json_body(serde_json::json!({"ok": true}));
            })
            .await;

        let transport = HttpTransport::new(RetryPolicy::none(), Duration::from_secs(5)).unwrap();
        let body = transport.post_json(&server.url("/rpc"), serde_json::json!({"q": 1})).await.unwrap();
        assert_eq!(body["ok"], true);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transport_retries_server_errors_against_real_socket() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky");
                then.status(503).body("unavailable");
            })
            .await;

        let transport = HttpTransport::new(RetryPolicy::from_millis(&[1, 1, 1]), Duration::from_secs(5)).unwrap();
        let err = transport.get_json(&server.url("/flaky"), Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn get_json_turns_client_status_into_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing").query_param("id", "7");
                then.status(404).body("nope");
            })
            .await;

        let transport = HttpTransport::new(RetryPolicy::default(), Duration::from_secs(5)).unwrap();
        let err = transport
            .get_json(&server.url("/missing"), vec![("id".into(), "7".into())])
            .await
            .unwrap_err();
        match err {
            crate::atoms::error::EngineError::Transport(TransportError::HttpClientError { status, .. }) => {
                assert_eq!(status, 404)
            }
            other => panic!("unexpected {:?}", other),
        }
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn slow_server_times_out_without_retry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200).delay(Duration::from_millis(1500)).body("{}");
            })
            .await;

        let transport = HttpTransport::new(RetryPolicy::from_millis(&[1, 1, 1]), Duration::from_millis(200)).unwrap();
        let err = transport.send(&RequestSpec::get(server.url("/slow"))).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }), "unexpected {:?}", err);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn refused_connection_is_connection_failed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpTransport::new(RetryPolicy::default(), Duration::from_secs(5)).unwrap();
        let err = transport
            .send(&RequestSpec::get(format!("http://127.0.0.1:{}/", port)))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }
}
