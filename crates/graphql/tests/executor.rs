//! Retry, timeout, and cancellation behaviour of the executor, driven through a
//! scripted in-process transport so that timing can be asserted on paused time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use domain::{ExecutionError, Operation, Transport, TransportResponse};
use graphql::{ExecutorConfig, ExponentialBackoff, RequestExecutor, MAX_RETRIES};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
enum Step {
    /// The transport itself fails (no HTTP response).
    Fail(&'static str),
    /// An HTTP response with the given status and body.
    Status(u16, &'static str),
    /// A 429 carrying `Retry-After`.
    Throttled(u64),
    /// A 200 response with a JSON body.
    Json(Value),
    /// Never answers.
    Hang,
}

#[derive(Debug)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _body: &[u8]) -> Result<TransportResponse, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more often than scripted");
        match step {
            Step::Fail(message) => Err(ExecutionError::Transport {
                message: message.to_string(),
            }),
            Step::Status(status, body) => Ok(TransportResponse::new(status, body)),
            Step::Throttled(seconds) => Ok(TransportResponse {
                status: 429,
                body: b"rate limited".to_vec(),
                retry_after: Some(Duration::from_secs(seconds)),
            }),
            Step::Json(value) => Ok(TransportResponse::new(
                200,
                serde_json::to_vec(&value).unwrap(),
            )),
            Step::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct WorkspaceData {
    #[serde(rename = "getProductBySlug")]
    workspace: Option<Workspace>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Workspace {
    id: String,
}

fn workspace_ok() -> Value {
    json!({"data": {"getProductBySlug": {"id": "UHJvZHVjdF8x"}}})
}

fn operation() -> Operation {
    Operation::new("query workspaceBySlug($slug: DefaultString!) { getProductBySlug(slug: $slug) { id } }")
        .with_operation_name("workspaceBySlug")
        .with_variable("slug", "acme")
}

fn executor(transport: Arc<ScriptedTransport>) -> RequestExecutor {
    RequestExecutor::with_transport(
        ExecutorConfig::new("https://api.example.test/graphql"),
        transport,
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn two_transport_failures_then_success_sleeps_twice() {
    let transport = ScriptedTransport::new(vec![
        Step::Fail("connection reset"),
        Step::Fail("connection reset"),
        Step::Json(workspace_ok()),
    ]);
    let executor = executor(transport.clone());

    let start = Instant::now();
    let response = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect("third attempt succeeds");

    assert_eq!(
        response.data.unwrap().workspace.unwrap().id,
        "UHJvZHVjdF8x"
    );
    assert_eq!(transport.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn failures_below_the_bound_still_succeed() {
    let transport = ScriptedTransport::new(vec![
        Step::Status(502, "bad gateway"),
        Step::Json(workspace_ok()),
    ]);
    let executor = executor(transport.clone());

    let response = executor.execute::<WorkspaceData>(&operation()).await;

    assert!(response.is_ok());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn persistent_failures_exhaust_exactly_max_attempts() {
    let transport = ScriptedTransport::new(vec![
        Step::Status(500, "boom-1"),
        Step::Fail("connection refused"),
        Step::Status(503, "boom-3"),
    ]);
    let executor = executor(transport.clone());

    let err = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect_err("all attempts fail");

    match err {
        ExecutionError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, MAX_RETRIES);
            assert!(matches!(
                *last,
                ExecutionError::HttpStatus { status: 503, ref body, .. } if body == "boom-3"
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn graphql_errors_are_returned_without_retrying() {
    let transport = ScriptedTransport::new(vec![Step::Json(json!({
        "data": {"getProductBySlug": null},
        "errors": [{"message": "Not authorized", "extensions": {"code": "FORBIDDEN"}}]
    }))]);
    let executor = executor(transport.clone());

    let response = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect("GraphQL errors are not an executor failure");

    assert_eq!(transport.calls(), 1);
    assert!(!response.is_ok());
    assert_eq!(response.errors[0].message, "Not authorized");
    assert_eq!(response.data, Some(WorkspaceData { workspace: None }));
}

#[tokio::test(start_paused = true)]
async fn strict_execution_turns_graphql_errors_into_failures() {
    let transport = ScriptedTransport::new(vec![Step::Json(json!({
        "errors": [{"message": "Not authorized"}]
    }))]);
    let executor = executor(transport.clone());

    let err = executor
        .execute_data::<WorkspaceData>(&operation())
        .await
        .expect_err("strict execution rejects errors");

    assert!(matches!(err, ExecutionError::Graphql { ref errors } if errors.len() == 1));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn decode_failures_are_not_retried() {
    let transport = ScriptedTransport::new(vec![Step::Json(json!({
        "data": {"getProductBySlug": {"id": 42}}
    }))]);
    let executor = executor(transport.clone());

    let err = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect_err("shape mismatch");

    assert!(matches!(err, ExecutionError::Decode { .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_json_success_body_is_a_decode_failure() {
    let transport = ScriptedTransport::new(vec![Step::Status(200, "<html>maintenance</html>")]);
    let executor = executor(transport.clone());

    let err = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect_err("not JSON");

    assert!(matches!(err, ExecutionError::Decode { .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeouts_are_transient() {
    let transport = ScriptedTransport::new(vec![Step::Hang, Step::Hang, Step::Hang]);
    let executor = executor(transport.clone());

    let start = Instant::now();
    let err = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect_err("every attempt times out");

    match err {
        ExecutionError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, ExecutionError::Timeout { after } if after == Duration::from_secs(30)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.calls(), 3);
    // three 30s timeouts plus two 1s pauses
    assert_eq!(start.elapsed(), Duration::from_secs(92));
}

#[tokio::test(start_paused = true)]
async fn timeout_then_success() {
    let transport = ScriptedTransport::new(vec![Step::Hang, Step::Json(workspace_ok())]);
    let executor = RequestExecutor::with_transport(
        ExecutorConfig::new("https://api.example.test/graphql")
            .with_timeout(Duration::from_secs(5)),
        transport.clone(),
    )
    .unwrap();

    let start = Instant::now();
    executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect("second attempt succeeds");

    assert_eq!(transport.calls(), 2);
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn retry_after_extends_the_pause() {
    let transport = ScriptedTransport::new(vec![Step::Throttled(5), Step::Json(workspace_ok())]);
    let executor = executor(transport.clone());

    let start = Instant::now();
    executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect("succeeds after throttling");

    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn huge_retry_after_is_capped() {
    let transport = ScriptedTransport::new(vec![
        Step::Throttled(86_400),
        Step::Json(workspace_ok()),
    ]);
    let executor = executor(transport.clone());

    let start = Instant::now();
    executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect("succeeds after throttling");

    assert_eq!(start.elapsed(), Duration::from_secs(60));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn retry_after_cap_is_configurable() {
    let transport = ScriptedTransport::new(vec![Step::Throttled(30), Step::Json(workspace_ok())]);
    let executor = RequestExecutor::with_transport(
        ExecutorConfig::new("https://api.example.test/graphql")
            .with_max_retry_after(Duration::from_secs(10)),
        transport,
    )
    .expect("valid config");

    let start = Instant::now();
    executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect("succeeds after throttling");

    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn exponential_backoff_can_replace_the_fixed_delay() {
    let transport = ScriptedTransport::new(vec![
        Step::Fail("reset"),
        Step::Fail("reset"),
        Step::Json(workspace_ok()),
    ]);
    let executor = RequestExecutor::with_transport(
        ExecutorConfig::new("https://api.example.test/graphql")
            .with_backoff(ExponentialBackoff::new(
                Duration::from_millis(500),
                Duration::from_secs(10),
            )),
        transport.clone(),
    )
    .unwrap();

    let start = Instant::now();
    executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect("third attempt succeeds");

    assert_eq!(start.elapsed(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_retry_pause() {
    let transport = ScriptedTransport::new(vec![Step::Fail("reset"), Step::Json(workspace_ok())]);
    let token = CancellationToken::new();
    let executor = executor(transport.clone()).with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        token.cancel();
    });

    let start = Instant::now();
    let err = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect_err("cancelled while waiting to retry");

    assert!(matches!(err, ExecutionError::Cancelled));
    assert_eq!(transport.calls(), 1);
    assert_eq!(start.elapsed(), Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_an_in_flight_request() {
    let transport = ScriptedTransport::new(vec![Step::Hang]);
    let token = CancellationToken::new();
    let executor = executor(transport.clone()).with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        token.cancel();
    });

    let err = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect_err("cancelled in flight");

    assert!(err.is_cancelled());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_executor_sends_nothing() {
    let transport = ScriptedTransport::new(vec![]);
    let token = CancellationToken::new();
    token.cancel();
    let executor = executor(transport.clone()).with_cancellation(token);

    let err = executor
        .execute::<WorkspaceData>(&operation())
        .await
        .expect_err("cancelled before the first attempt");

    assert!(matches!(err, ExecutionError::Cancelled));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn zero_attempts_is_rejected() {
    let transport = ScriptedTransport::new(vec![]);
    let result = RequestExecutor::with_transport(
        ExecutorConfig::new("https://api.example.test/graphql").with_max_attempts(0),
        transport,
    );
    assert!(matches!(result, Err(ExecutionError::Configuration { .. })));
}

#[tokio::test]
async fn zero_timeout_is_rejected() {
    let transport = ScriptedTransport::new(vec![]);
    let result = RequestExecutor::with_transport(
        ExecutorConfig::new("https://api.example.test/graphql").with_timeout(Duration::ZERO),
        transport,
    );
    assert!(matches!(result, Err(ExecutionError::Configuration { .. })));
}
