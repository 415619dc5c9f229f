//! Asynchronous AI feedback on a submission.
//!
//! The worker runs detached from the caller and hands its single `FeedbackResult`
//! to a completion callback. Attempts escalate their deadline (`base * (i + 1)`)
//! so the first try fails fast and later ones tolerate a cold model. There is no
//! extra sleep between attempts: the escalating deadline is the only backoff.
//!
//! Attempt outcomes:
//!   - 200 + parseable body  -> done (success, or service_error if the analyzer said so)
//!   - non-200               -> next attempt; exhausted -> max_retries_exceeded
//!   - timeout               -> next attempt; on the last one -> timeout_error
//!   - connection refused    -> connection_error, no retry
//!   - anything else         -> unexpected_error, no retry

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::FeedbackSettings;
use crate::evaluation::EvaluationResult;
use crate::packager::SubmissionPayload;
use crate::protocol::{AnalyzeIn, AnalyzeOut};
use crate::util::{cap_chars, trunc_for_log};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
  Success,
  ConnectionError,
  TimeoutError,
  UnexpectedError,
  MaxRetriesExceeded,
  /// The analyzer answered 200 but reported its own failure.
  ServiceError,
}

impl FeedbackStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      FeedbackStatus::Success => "success",
      FeedbackStatus::ConnectionError => "connection_error",
      FeedbackStatus::TimeoutError => "timeout_error",
      FeedbackStatus::UnexpectedError => "unexpected_error",
      FeedbackStatus::MaxRetriesExceeded => "max_retries_exceeded",
      FeedbackStatus::ServiceError => "service_error",
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FeedbackRequest {
  pub code: String,
  pub evaluation_summary: String,
  pub problem_statement: String,
  pub language: String,
}

impl FeedbackRequest {
  pub fn from_evaluation(
    payload: &SubmissionPayload,
    result: &EvaluationResult,
    language: &str,
    digest_max_chars: usize,
  ) -> Self {
    Self {
      code: payload.code.clone(),
      evaluation_summary: evaluation_digest(result, digest_max_chars),
      problem_statement: payload.problem_statement.clone(),
      language: language.to_string(),
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FeedbackResult {
  pub status: FeedbackStatus,
  pub message: String,
  pub feedback_text: String,
  /// Analyze calls actually made (the health check is not counted).
  pub attempts: u32,
}

impl FeedbackResult {
  fn new(status: FeedbackStatus, message: impl Into<String>, attempts: u32) -> Self {
    Self { status, message: message.into(), feedback_text: String::new(), attempts }
  }
}

/// Raw HTTP answer from one analyze call. Parsing happens in the retry loop
/// so every backend shares the same status handling.
#[derive(Clone, Debug)]
pub struct FeedbackReply {
  pub status: u16,
  pub body: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedbackTransportError {
  #[error("no answer within {0:?}")]
  Timeout(Duration),
  #[error("connection refused: {0}")]
  Connect(String),
  #[error("{0}")]
  Other(String),
}

#[async_trait]
pub trait FeedbackBackend: Send + Sync {
  /// One analyze call bounded by `timeout`.
  async fn analyze(&self, req: &FeedbackRequest, timeout: Duration) -> Result<FeedbackReply, FeedbackTransportError>;
  /// Liveness check.
  async fn health(&self) -> Result<(), FeedbackTransportError>;
}

/// Stand-in when no feedback service is configured: categorically unreachable.
#[derive(Clone, Debug, Default)]
pub struct NullFeedbackBackend;

#[async_trait]
impl FeedbackBackend for NullFeedbackBackend {
  async fn analyze(&self, _req: &FeedbackRequest, _timeout: Duration) -> Result<FeedbackReply, FeedbackTransportError> {
    Err(FeedbackTransportError::Connect("feedback client not configured".into()))
  }

  async fn health(&self) -> Result<(), FeedbackTransportError> {
    Err(FeedbackTransportError::Connect("feedback client not configured".into()))
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub base_timeout: Duration,
  pub check_health: bool,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 2, base_timeout: Duration::from_secs(30), check_health: false }
  }
}

/// Upper bound on the configured base deadline (one hour).
pub const MAX_BASE_TIMEOUT: Duration = Duration::from_secs(3600);

impl RetryPolicy {
  pub fn from_settings(s: &FeedbackSettings) -> Self {
    let requested = Duration::from_secs(s.base_timeout_secs);
    if requested > MAX_BASE_TIMEOUT {
      warn!(target: "feedback", requested_secs = s.base_timeout_secs, max_secs = MAX_BASE_TIMEOUT.as_secs(), "Feedback base timeout clamped");
    }
    Self {
      max_attempts: s.max_attempts,
      base_timeout: requested.min(MAX_BASE_TIMEOUT),
      check_health: s.check_health,
    }
  }

  /// At least one attempt is always made.
  pub fn attempts(&self) -> u32 {
    self.max_attempts.max(1)
  }

  /// `base * (attempt + 1)`, saturating at `Duration::MAX`.
  pub fn timeout_for(&self, attempt: u32) -> Duration {
    self.base_timeout.saturating_mul(attempt.saturating_add(1))
  }
}

enum Step {
  Done(FeedbackResult),
  Retry,
}

/// The retry loop. Total: every path ends in a `FeedbackResult`.
#[instrument(level = "info", skip(backend, req), fields(code_len = req.code.len(), digest_len = req.evaluation_summary.len(), max_attempts = policy.attempts()))]
pub async fn request_feedback(backend: &dyn FeedbackBackend, policy: &RetryPolicy, req: &FeedbackRequest) -> FeedbackResult {
  if policy.check_health {
    match backend.health().await {
      Err(FeedbackTransportError::Connect(e)) => {
        warn!(target: "feedback", error = %e, "Health check refused; skipping analysis");
        return FeedbackResult::new(FeedbackStatus::ConnectionError, CONNECTION_GUIDANCE, 0);
      }
      Err(e) => debug!(target: "feedback", error = %e, "Health check inconclusive; attempting anyway"),
      Ok(()) => debug!(target: "feedback", "Health check ok"),
    }
  }

  let attempts = policy.attempts();
  for attempt in 0..attempts {
    let timeout = policy.timeout_for(attempt);
    let is_last = attempt + 1 == attempts;
    let start = Instant::now();
    let outcome = backend.analyze(req, timeout).await;
    let elapsed = start.elapsed();

    match classify(outcome, attempt + 1, is_last) {
      Step::Done(result) => {
        info!(target: "feedback", attempt, ?elapsed, timeout_ms = timeout.as_millis() as u64, status = result.status.as_str(), "Feedback finished");
        return result;
      }
      Step::Retry => {
        debug!(target: "feedback", attempt, ?elapsed, next_timeout_ms = policy.timeout_for(attempt + 1).as_millis() as u64, "Retrying feedback");
      }
    }
  }

  warn!(target: "feedback", attempts, "Feedback attempts exhausted");
  FeedbackResult::new(
    FeedbackStatus::MaxRetriesExceeded,
    format!("The feedback service kept failing after {attempts} attempts. Try again later."),
    attempts,
  )
}

const CONNECTION_GUIDANCE: &str = "Could not reach the feedback service. Check that the AI analyzer is running.";
const TIMEOUT_GUIDANCE: &str = "The feedback service did not answer in time; the model may still be warming up. Request feedback again in a minute.";

fn classify(outcome: Result<FeedbackReply, FeedbackTransportError>, attempts: u32, is_last: bool) -> Step {
  match outcome {
    Ok(reply) if reply.status == 200 => match serde_json::from_str::<AnalyzeOut>(&reply.body) {
      Ok(out) if out.status == "success" => Step::Done(FeedbackResult {
        status: FeedbackStatus::Success,
        message: out.message,
        feedback_text: out.feedback_completo,
        attempts,
      }),
      Ok(out) => {
        warn!(target: "feedback", remote_status = %out.status, message = %out.message, "Analyzer reported a failure");
        Step::Done(FeedbackResult {
          status: FeedbackStatus::ServiceError,
          message: if out.message.is_empty() { "The feedback service could not analyze this submission.".into() } else { out.message },
          feedback_text: out.feedback_completo,
          attempts,
        })
      }
      Err(e) => {
        error!(target: "feedback", error = %e, body = %trunc_for_log(&reply.body, 200), "Unreadable feedback body");
        Step::Done(FeedbackResult::new(
          FeedbackStatus::UnexpectedError,
          format!("Unexpected error while reading feedback: {e}"),
          attempts,
        ))
      }
    },
    Ok(reply) => {
      warn!(target: "feedback", http_status = reply.status, body = %trunc_for_log(&reply.body, 200), "Feedback service returned non-200");
      Step::Retry
    }
    Err(FeedbackTransportError::Timeout(t)) => {
      if is_last {
        warn!(target: "feedback", timeout_ms = t.as_millis() as u64, "Last feedback attempt timed out");
        Step::Done(FeedbackResult::new(FeedbackStatus::TimeoutError, TIMEOUT_GUIDANCE, attempts))
      } else {
        warn!(target: "feedback", timeout_ms = t.as_millis() as u64, "Feedback attempt timed out");
        Step::Retry
      }
    }
    Err(FeedbackTransportError::Connect(e)) => {
      error!(target: "feedback", error = %e, "Feedback service unreachable");
      Step::Done(FeedbackResult::new(FeedbackStatus::ConnectionError, CONNECTION_GUIDANCE, attempts))
    }
    Err(FeedbackTransportError::Other(e)) => {
      error!(target: "feedback", error = %e, "Feedback request failed");
      Step::Done(FeedbackResult::new(
        FeedbackStatus::UnexpectedError,
        format!("Unexpected error while requesting feedback: {e}"),
        attempts,
      ))
    }
  }
}

/// Detached runner for `request_feedback`.
#[derive(Clone)]
pub struct FeedbackWorker {
  backend: Arc<dyn FeedbackBackend>,
  policy: RetryPolicy,
}

impl FeedbackWorker {
  pub fn new(backend: Arc<dyn FeedbackBackend>, policy: RetryPolicy) -> Self {
    Self { backend, policy }
  }

  pub fn policy(&self) -> &RetryPolicy {
    &self.policy
  }

  /// Fire-and-forget: the result only ever reaches `on_done`. The handle may be
  /// dropped; the task then runs to completion detached.
  pub fn spawn<F>(&self, runtime: &tokio::runtime::Handle, req: FeedbackRequest, on_done: F) -> JoinHandle<()>
  where
    F: FnOnce(FeedbackResult) + Send + 'static,
  {
    let backend = self.backend.clone();
    let policy = self.policy.clone();
    runtime.spawn(async move {
      let result = request_feedback(backend.as_ref(), &policy, &req).await;
      on_done(result);
    })
  }
}

/// Text sent as `resultados_evaluacion`: status, counts, compiler output and the
/// failing tests, capped at `max_chars` characters.
pub fn evaluation_digest(result: &EvaluationResult, max_chars: usize) -> String {
  let mut out = format!(
    "Status: {}\nSummary: {}\nTests passed: {}/{}\nExecution time: {} ms\n",
    result.status.as_str(),
    result.summary,
    result.passed_count,
    result.total_tests,
    result.execution_time_ms,
  );
  if !result.compilation_output.trim().is_empty() {
    out.push_str(&format!("Compiler output:\n{}\n", result.compilation_output.trim_end()));
  }
  if !result.execution_output.trim().is_empty() {
    out.push_str(&format!("Program output:\n{}\n", result.execution_output.trim_end()));
  }
  for t in result.tests.iter().filter(|t| !t.passed) {
    out.push_str(&format!(
      "Failed test {}: input={:?} expected={:?} obtained={:?}\n",
      t.id, t.input, t.expected, t.obtained
    ));
  }
  cap_chars(&out, max_chars)
}

#[derive(Clone)]
pub struct HttpFeedbackClient {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl HttpFeedbackClient {
  /// Deadlines are per request (they escalate), so the client itself has none.
  pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().build()?;
    Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
  }

  pub fn from_settings(s: &FeedbackSettings) -> Result<Self, reqwest::Error> {
    Self::new(s.base_url.clone())
  }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> FeedbackTransportError {
  if e.is_timeout() {
    FeedbackTransportError::Timeout(timeout)
  } else if e.is_connect() {
    FeedbackTransportError::Connect(e.to_string())
  } else {
    FeedbackTransportError::Other(e.to_string())
  }
}

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
impl FeedbackBackend for HttpFeedbackClient {
  #[instrument(level = "debug", skip(self, req), fields(timeout_ms = timeout.as_millis() as u64))]
  async fn analyze(&self, req: &FeedbackRequest, timeout: Duration) -> Result<FeedbackReply, FeedbackTransportError> {
    let body = AnalyzeIn {
      codigo_usuario: req.code.clone(),
      resultados_evaluacion: req.evaluation_summary.clone(),
      problema_enunciado: req.problem_statement.clone(),
      lenguaje: req.language.clone(),
    };
    let res = self.client.post(format!("{}/analyze_solution", self.base_url))
      .header(USER_AGENT, "codecoach-sync/0.1")
      .header(CONTENT_TYPE, "application/json")
      .timeout(timeout)
      .json(&body)
      .send()
      .await
      .map_err(|e| transport_error(e, timeout))?;
    let status = res.status().as_u16();
    let body = res.text().await.map_err(|e| transport_error(e, timeout))?;
    Ok(FeedbackReply { status, body })
  }

  async fn health(&self) -> Result<(), FeedbackTransportError> {
    let res = self.client.get(format!("{}/health", self.base_url))
      .timeout(HEALTH_TIMEOUT)
      .send()
      .await
      .map_err(|e| transport_error(e, HEALTH_TIMEOUT))?;
    if res.status().is_success() {
      Ok(())
    } else {
      Err(FeedbackTransportError::Other(format!("health check answered HTTP {}", res.status())))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::evaluation::EvaluationStatus;
  use crate::protocol::TestCaseOut;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  /// Plays back canned outcomes and records the deadline each attempt was given.
  #[derive(Default)]
  struct Scripted {
    outcomes: Mutex<VecDeque<Result<FeedbackReply, FeedbackTransportError>>>,
    timeouts: Mutex<Vec<Duration>>,
    health: Option<FeedbackTransportError>,
  }

  impl Scripted {
    fn new(outcomes: Vec<Result<FeedbackReply, FeedbackTransportError>>) -> Self {
      Self { outcomes: Mutex::new(outcomes.into()), ..Default::default() }
    }

    fn timeouts(&self) -> Vec<Duration> {
      self.timeouts.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl FeedbackBackend for Scripted {
    async fn analyze(&self, _req: &FeedbackRequest, timeout: Duration) -> Result<FeedbackReply, FeedbackTransportError> {
      self.timeouts.lock().unwrap().push(timeout);
      self.outcomes.lock().unwrap().pop_front().unwrap_or_else(|| Err(FeedbackTransportError::Other("script exhausted".into())))
    }

    async fn health(&self) -> Result<(), FeedbackTransportError> {
      match &self.health {
        Some(e) => Err(e.clone()),
        None => Ok(()),
      }
    }
  }

  fn ok_reply(text: &str) -> Result<FeedbackReply, FeedbackTransportError> {
    Ok(FeedbackReply {
      status: 200,
      body: serde_json::json!({"status": "success", "message": "done", "feedback_completo": text}).to_string(),
    })
  }

  fn http(status: u16) -> Result<FeedbackReply, FeedbackTransportError> {
    Ok(FeedbackReply { status, body: "Internal Server Error".into() })
  }

  fn timeout() -> Result<FeedbackReply, FeedbackTransportError> {
    Err(FeedbackTransportError::Timeout(Duration::from_secs(30)))
  }

  fn request() -> FeedbackRequest {
    FeedbackRequest {
      code: "int main() { return 0; }".into(),
      evaluation_summary: "Status: success".into(),
      problem_statement: "Add two numbers.".into(),
      language: "C++".into(),
    }
  }

  fn policy() -> RetryPolicy {
    RetryPolicy { max_attempts: 2, base_timeout: Duration::from_secs(30), check_health: false }
  }

  #[tokio::test]
  async fn timeout_then_success_escalates_the_deadline() {
    let backend = Scripted::new(vec![timeout(), ok_reply("O(n) looks right")]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::Success);
    assert_eq!(out.feedback_text, "O(n) looks right");
    assert_eq!(out.attempts, 2);
    assert_eq!(backend.timeouts(), vec![Duration::from_secs(30), Duration::from_secs(60)]);
  }

  #[tokio::test]
  async fn first_success_stops_immediately() {
    let backend = Scripted::new(vec![ok_reply("fine"), ok_reply("never read")]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::Success);
    assert_eq!(backend.timeouts().len(), 1);
  }

  #[tokio::test]
  async fn repeated_server_errors_exhaust_the_attempts() {
    let backend = Scripted::new(vec![http(500), http(500)]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::MaxRetriesExceeded);
    assert_eq!(out.attempts, 2);
    assert_eq!(backend.timeouts().len(), 2);
  }

  #[tokio::test]
  async fn timeout_on_last_attempt_is_timeout_error() {
    let backend = Scripted::new(vec![timeout(), timeout()]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::TimeoutError);
    assert!(out.message.contains("warming up"));
  }

  #[tokio::test]
  async fn refused_connection_is_not_retried() {
    let backend = Scripted::new(vec![Err(FeedbackTransportError::Connect("refused".into())), ok_reply("x")]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::ConnectionError);
    assert_eq!(backend.timeouts().len(), 1);
  }

  #[tokio::test]
  async fn other_failures_are_unexpected_errors_with_text() {
    let backend = Scripted::new(vec![Err(FeedbackTransportError::Other("tls handshake failed".into()))]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::UnexpectedError);
    assert!(out.message.contains("tls handshake failed"));
  }

  #[tokio::test]
  async fn unreadable_success_body_is_unexpected_error() {
    let backend = Scripted::new(vec![Ok(FeedbackReply { status: 200, body: "<html>".into() })]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::UnexpectedError);
    assert_eq!(backend.timeouts().len(), 1);
  }

  #[tokio::test]
  async fn analyzer_reported_error_is_terminal() {
    let body = serde_json::json!({"status": "error", "message": "empty code", "feedback_completo": "write some code"}).to_string();
    let backend = Scripted::new(vec![Ok(FeedbackReply { status: 200, body }), ok_reply("x")]);
    let out = request_feedback(&backend, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::ServiceError);
    assert_eq!(out.message, "empty code");
    assert_eq!(backend.timeouts().len(), 1);
  }

  #[tokio::test]
  async fn refused_health_check_skips_the_attempts() {
    let mut backend = Scripted::new(vec![ok_reply("x")]);
    backend.health = Some(FeedbackTransportError::Connect("refused".into()));
    let checking = RetryPolicy { check_health: true, ..policy() };
    let out = request_feedback(&backend, &checking, &request()).await;
    assert_eq!(out.status, FeedbackStatus::ConnectionError);
    assert_eq!(out.attempts, 0);
    assert!(backend.timeouts().is_empty());
  }

  #[tokio::test]
  async fn zero_attempts_still_tries_once() {
    let backend = Scripted::new(vec![ok_reply("x")]);
    let once = RetryPolicy { max_attempts: 0, ..policy() };
    let out = request_feedback(&backend, &once, &request()).await;
    assert_eq!(out.status, FeedbackStatus::Success);
  }

  #[test]
  fn deadlines_saturate_instead_of_overflowing() {
    let huge = RetryPolicy { base_timeout: Duration::MAX, ..policy() };
    assert_eq!(huge.timeout_for(1), Duration::MAX);
    assert_eq!(huge.timeout_for(u32::MAX), Duration::MAX);

    let settings = FeedbackSettings { base_timeout_secs: u64::MAX, ..FeedbackSettings::default() };
    let clamped = RetryPolicy::from_settings(&settings);
    assert_eq!(clamped.base_timeout, MAX_BASE_TIMEOUT);
    assert_eq!(clamped.timeout_for(1), MAX_BASE_TIMEOUT * 2);
  }

  #[tokio::test]
  async fn worker_with_an_enormous_deadline_still_reports_once() {
    let backend = Arc::new(Scripted::new(vec![timeout(), ok_reply("eventually")]));
    let huge = RetryPolicy { base_timeout: Duration::MAX, ..policy() };
    let worker = FeedbackWorker::new(backend.clone(), huge);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = worker.spawn(&tokio::runtime::Handle::current(), request(), move |result| {
      let _ = tx.send(result);
    });
    handle.await.unwrap();
    let out = rx.recv().await.unwrap();
    assert_eq!(out.status, FeedbackStatus::Success);
    assert!(rx.recv().await.is_none());
    assert_eq!(backend.timeouts(), vec![Duration::MAX, Duration::MAX]);
  }

  #[tokio::test]
  async fn worker_delivers_through_the_callback() {
    let backend = Arc::new(Scripted::new(vec![http(503), ok_reply("late but fine")]));
    let worker = FeedbackWorker::new(backend, policy());
    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = worker.spawn(&tokio::runtime::Handle::current(), request(), move |result| {
      let _ = tx.send(result);
    });
    let out = rx.await.unwrap();
    handle.await.unwrap();
    assert_eq!(out.status, FeedbackStatus::Success);
    assert_eq!(out.feedback_text, "late but fine");
  }

  #[tokio::test]
  async fn http_client_against_mock_analyzer() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, crate::routes::build_feedback_router()).await.unwrap();
    });
    let client = HttpFeedbackClient::new(format!("http://{addr}")).unwrap();
    let checking = RetryPolicy { check_health: true, ..policy() };
    let out = request_feedback(&client, &checking, &request()).await;
    assert_eq!(out.status, FeedbackStatus::Success);
    assert!(out.feedback_text.contains("Estimated complexity"));
  }

  #[tokio::test]
  async fn http_client_unreachable_is_connection_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HttpFeedbackClient::new(format!("http://{addr}")).unwrap();
    let out = request_feedback(&client, &policy(), &request()).await;
    assert_eq!(out.status, FeedbackStatus::ConnectionError);
  }

  #[test]
  fn digest_lists_failures_and_respects_the_cap() {
    let mut result = EvaluationResult::failure(EvaluationStatus::RuntimeError, "crash");
    result.summary = "1/2 tests passed".into();
    result.passed_count = 1;
    result.total_tests = 2;
    result.tests = vec![
      TestCaseOut { id: "1".into(), input: "1 2".into(), obtained: "3".into(), expected: "3".into(), passed: true },
      TestCaseOut { id: "2".into(), input: "2 2".into(), obtained: "5".into(), expected: "4".into(), passed: false },
    ];
    let digest = evaluation_digest(&result, 10_000);
    assert!(digest.contains("Status: runtime_error"));
    assert!(digest.contains("Tests passed: 1/2"));
    assert!(digest.contains("Failed test 2"));
    assert!(!digest.contains("Failed test 1"));

    let capped = evaluation_digest(&result, 20);
    assert!(capped.ends_with("[... truncated]"));
  }
}
