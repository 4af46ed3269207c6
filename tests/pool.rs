//! End-to-end pool behavior against mock transports.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use reqwest_agent_pool::{
    AgentConfig, DefaultPolicy, Error, HealthState, Outcome, Pool, ProxyAgent, RateGate, Transport,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

struct OpenGate;

impl RateGate for OpenGate {
    fn allow(&self) -> bool {
        true
    }
    fn tokens(&self) -> f64 {
        10.0
    }
}

fn response(status: u16, body: &'static str) -> reqwest::Response {
    reqwest::Response::from(
        http::Response::builder()
            .status(status)
            .header("x-served-by", "mock")
            .body(body)
            .unwrap(),
    )
}

/// Replies with a fixed status and body, recording every request body seen.
struct ScriptedTransport {
    status: u16,
    body: &'static str,
    calls: AtomicUsize,
    bodies: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
    fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            calls: AtomicUsize::new(0),
            bodies: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(bytes) = request.body().and_then(|b| b.as_bytes()) {
            self.bodies.lock().push(bytes.to_vec());
        }
        Ok(response(self.status, self.body))
    }
}

struct FailingTransport {
    calls: AtomicUsize,
}

impl FailingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn execute(&self, _request: reqwest::Request) -> Result<reqwest::Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Transport("connection refused".into()))
    }
}

struct CancelledTransport;

#[async_trait]
impl Transport for CancelledTransport {
    async fn execute(&self, _request: reqwest::Request) -> Result<reqwest::Response, Error> {
        Err(Error::Cancelled("deadline elapsed".into()))
    }
}

struct SlowTransport {
    started: Notify,
    finished: AtomicBool,
}

#[async_trait]
impl Transport for SlowTransport {
    async fn execute(&self, _request: reqwest::Request) -> Result<reqwest::Response, Error> {
        self.started.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(response(200, ""))
    }
}

fn agent_with(transport: Arc<dyn Transport>) -> Arc<ProxyAgent> {
    Arc::new(ProxyAgent::with_transport(
        Url::parse("socks5://10.1.1.1:1080").unwrap(),
        Arc::new(OpenGate),
        transport,
        &AgentConfig::default(),
    ))
}

fn get_request() -> reqwest::Request {
    reqwest::Request::new(
        reqwest::Method::GET,
        Url::parse("http://example.com/").unwrap(),
    )
}

fn post_request(body: &'static str) -> reqwest::Request {
    reqwest::Client::new()
        .post("http://example.com/submit")
        .body(body)
        .build()
        .unwrap()
}

/// Give an agent a last-request timestamp so LRU ordering is deterministic.
async fn warm(agent: &ProxyAgent) {
    agent.execute(get_request()).await.unwrap();
}

#[tokio::test]
async fn round_trip_through_single_agent() {
    let transport = ScriptedTransport::new(200, "hello");
    let agent = agent_with(transport.clone());
    let pool = Pool::new(DefaultPolicy);
    pool.add("p1", Arc::clone(&agent));

    let response = pool.execute(get_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-served-by"], "mock");
    assert_eq!(response.text().await.unwrap(), "hello");

    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.state().state, HealthState::Ok);
}

#[tokio::test]
async fn banned_agent_falls_through_to_healthy_one() {
    let banned_transport = ScriptedTransport::new(403, "");
    let healthy_transport = ScriptedTransport::new(200, "hello");
    let first = agent_with(banned_transport.clone());
    let second = agent_with(healthy_transport.clone());

    // `second` has a request on record, so `first` orders ahead of it.
    warm(&second).await;
    first.set_state(HealthState::Ok, "");
    second.set_state(HealthState::Ok, "");

    let pool = Pool::new(DefaultPolicy);
    pool.add("first", Arc::clone(&first));
    pool.add("second", Arc::clone(&second));

    let response = pool.execute(get_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "hello");

    assert_eq!(banned_transport.calls.load(Ordering::SeqCst), 1);
    let report = first.state();
    assert_eq!(report.state, HealthState::Banned);
    assert_eq!(report.message, "403");
    assert_eq!(second.state().state, HealthState::Ok);
}

#[tokio::test]
async fn retry_cap_bounds_a_single_failing_agent() {
    let transport = FailingTransport::new();
    let pool = Pool::new(DefaultPolicy);
    pool.add("p1", agent_with(transport.clone()));

    let err = pool.execute(get_request()).await.unwrap_err();
    assert!(matches!(err, Error::NoHealthyAgents));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn request_body_replayed_on_every_attempt() {
    let flaky = ScriptedTransport::new(500, "");
    let healthy = ScriptedTransport::new(200, "");
    let first = agent_with(flaky.clone());
    let second = agent_with(healthy.clone());

    warm(&second).await;
    first.set_state(HealthState::Ok, "");
    second.set_state(HealthState::Ok, "");

    let retry_on_non_ok = |outcome: &mut Outcome| {
        outcome.retry = outcome.status() != Some(StatusCode::OK);
    };
    let pool = Pool::new(retry_on_non_ok);
    pool.add("first", first);
    pool.add("second", second);

    let response = pool.execute(post_request("payload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(*flaky.bodies.lock(), vec![b"payload".to_vec()]);
    assert_eq!(*healthy.bodies.lock(), vec![b"payload".to_vec()]);
}

#[tokio::test]
async fn cancellation_bypasses_policy_and_remaining_candidates() {
    let healthy_transport = ScriptedTransport::new(200, "");
    let first = agent_with(Arc::new(CancelledTransport));
    let second = agent_with(healthy_transport.clone());

    warm(&second).await;
    first.set_state(HealthState::Ok, "");
    second.set_state(HealthState::Ok, "");

    let policy_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&policy_calls);
    let pool = Pool::new(move |_: &mut Outcome| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    pool.add("first", first);
    pool.add("second", second);

    let err = pool.execute(get_request()).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(policy_calls.load(Ordering::SeqCst), 0);
    // only the warm-up call reached the second agent
    assert_eq!(healthy_transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_pool_has_no_healthy_agents() {
    let pool = Pool::new(DefaultPolicy);
    let err = pool.execute(get_request()).await.unwrap_err();
    assert!(matches!(err, Error::NoHealthyAgents));
}

#[tokio::test]
async fn close_waits_for_in_flight_requests() {
    let transport = Arc::new(SlowTransport {
        started: Notify::new(),
        finished: AtomicBool::new(false),
    });
    let agent = agent_with(transport.clone());

    let worker = {
        let agent = Arc::clone(&agent);
        tokio::spawn(async move { agent.execute(get_request()).await })
    };
    transport.started.notified().await;

    agent.close().await;
    assert!(transport.finished.load(Ordering::SeqCst));
    assert!(worker.await.unwrap().is_ok());

    let err = agent.execute(get_request()).await.unwrap_err();
    assert!(matches!(err, Error::AgentClosed));
}

#[tokio::test]
async fn status_serializes_to_json() {
    let pool = Pool::new(DefaultPolicy);
    pool.add("p1", agent_with(ScriptedTransport::new(200, "")));

    let json = serde_json::to_string(&pool.status()).unwrap();
    assert!(json.contains("\"name\":\"10.1.1.1:1080\""));
    assert!(json.contains("\"requests\":0"));
}
