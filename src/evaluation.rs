//! Client for the remote evaluation (compile + test) service.
//!
//! Every failure mode is folded into `EvaluationResult::status` so callers branch
//! on one shape. Requests are sent once: compilation may be slow or have side
//! effects on the service, so a failed evaluation is never retried blindly.
//! We log statuses, latencies and body sizes, never the submitted code.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::EvaluationSettings;
use crate::packager::SubmissionPayload;
use crate::protocol::{EvaluationRequest, EvaluationResponse, RemoteEvaluationStatus, TestCaseOut};
use crate::util::trunc_for_log;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
  Success,
  CompileError,
  RuntimeError,
  ConnectionError,
  TimeoutError,
  HttpError,
  JsonError,
  CriticalError,
}

impl EvaluationStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      EvaluationStatus::Success => "success",
      EvaluationStatus::CompileError => "compile_error",
      EvaluationStatus::RuntimeError => "runtime_error",
      EvaluationStatus::ConnectionError => "connection_error",
      EvaluationStatus::TimeoutError => "timeout_error",
      EvaluationStatus::HttpError => "http_error",
      EvaluationStatus::JsonError => "json_error",
      EvaluationStatus::CriticalError => "critical_error",
    }
  }

  /// Reported by the evaluator itself (a real evaluation happened).
  pub fn is_semantic(&self) -> bool {
    matches!(self, EvaluationStatus::Success | EvaluationStatus::CompileError | EvaluationStatus::RuntimeError)
  }

  pub fn is_transport(&self) -> bool {
    matches!(self, EvaluationStatus::ConnectionError | EvaluationStatus::TimeoutError)
  }

  pub fn is_protocol(&self) -> bool {
    matches!(self, EvaluationStatus::HttpError | EvaluationStatus::JsonError)
  }

  /// `semantic`, `transport`, `protocol` or `internal`, for logs and metrics labels.
  pub fn class(&self) -> &'static str {
    if self.is_semantic() {
      "semantic"
    } else if self.is_transport() {
      "transport"
    } else if self.is_protocol() {
      "protocol"
    } else {
      "internal"
    }
  }

  /// Actionable text shown to the learner for this status.
  pub fn user_message(&self) -> &'static str {
    match self {
      EvaluationStatus::Success => "Evaluation completed.",
      EvaluationStatus::CompileError => "Your code did not compile. Check the compiler output below.",
      EvaluationStatus::RuntimeError => "Your program failed while running the tests.",
      EvaluationStatus::ConnectionError => "Could not reach the evaluation service. Check that the evaluation service is running.",
      EvaluationStatus::TimeoutError => "The evaluation service is slow to answer. Retry shortly.",
      EvaluationStatus::HttpError => "The evaluation service rejected the request. See the diagnostics for details.",
      EvaluationStatus::JsonError => "The evaluation service sent a response that could not be read.",
      EvaluationStatus::CriticalError => "Unexpected error while evaluating. Your submission was not processed.",
    }
  }
}

impl From<RemoteEvaluationStatus> for EvaluationStatus {
  fn from(s: RemoteEvaluationStatus) -> Self {
    match s {
      RemoteEvaluationStatus::Success => EvaluationStatus::Success,
      RemoteEvaluationStatus::CompileError => EvaluationStatus::CompileError,
      RemoteEvaluationStatus::RuntimeError => EvaluationStatus::RuntimeError,
    }
  }
}

/// Most points a single solve may award. Remote scores are clamped to `0..=` this.
pub const MAX_POINTS_PER_SOLVE: i64 = 1_000_000;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EvaluationResult {
  pub status: EvaluationStatus,
  /// Human-readable line for the output panel.
  pub summary: String,
  /// Remote message, or the technical detail behind a client-side failure.
  pub message: String,
  pub passed_count: u32,
  pub total_tests: u32,
  /// Points awarded by the evaluator, not yet applied to the user.
  pub score: i64,
  pub problem_solved: bool,
  pub tests: Vec<TestCaseOut>,
  pub compilation_output: String,
  pub execution_output: String,
  pub execution_time_ms: u64,
  pub http_status: Option<u16>,
  /// Raw response body kept for diagnostics on protocol failures.
  pub raw_body: Option<String>,
}

impl EvaluationResult {
  /// Client-side failure carrying the status' own user message as summary.
  pub fn failure(status: EvaluationStatus, detail: impl Into<String>) -> Self {
    Self {
      status,
      summary: status.user_message().to_string(),
      message: detail.into(),
      passed_count: 0,
      total_tests: 0,
      score: 0,
      problem_solved: false,
      tests: Vec::new(),
      compilation_output: String::new(),
      execution_output: String::new(),
      execution_time_ms: 0,
      http_status: None,
      raw_body: None,
    }
  }

  pub fn from_response(r: EvaluationResponse) -> Self {
    let status = EvaluationStatus::from(r.status);
    let score = r.score.clamp(0, MAX_POINTS_PER_SOLVE);
    if score != r.score {
      warn!(target: "evaluation", reported = r.score, applied = score, "Evaluator score out of range; clamped");
    }
    let summary = if !r.summary.trim().is_empty() {
      r.summary
    } else if !r.message.trim().is_empty() {
      r.message.clone()
    } else {
      status.user_message().to_string()
    };
    Self {
      status,
      summary,
      message: r.message,
      passed_count: r.passed_count,
      total_tests: r.total_tests,
      score,
      // Only a successful run can solve a problem.
      problem_solved: r.problem_solved && status == EvaluationStatus::Success,
      tests: r.tests,
      compilation_output: r.compilation_output,
      execution_output: r.execution_output,
      execution_time_ms: r.execution_time_ms,
      http_status: Some(200),
      raw_body: None,
    }
  }

  pub fn is_solved(&self) -> bool {
    self.status == EvaluationStatus::Success && self.problem_solved
  }
}

/// Anything that can evaluate a packaged submission. Implementations must be
/// total: every failure comes back as a result, never a panic or error.
#[async_trait]
pub trait EvaluationBackend: Send + Sync {
  async fn evaluate(&self, payload: &SubmissionPayload) -> EvaluationResult;
}

/// Stand-in when no evaluation service is configured.
#[derive(Clone, Debug, Default)]
pub struct NullEvaluationBackend;

#[async_trait]
impl EvaluationBackend for NullEvaluationBackend {
  async fn evaluate(&self, payload: &SubmissionPayload) -> EvaluationResult {
    warn!(target: "evaluation", problem = %payload.problem_title, "No evaluation backend configured");
    EvaluationResult::failure(EvaluationStatus::ConnectionError, "evaluation client not configured")
  }
}

/// Runs a backend on its own task so that even a panicking implementation
/// yields `critical_error` instead of tearing down the caller.
pub async fn evaluate_guarded(backend: Arc<dyn EvaluationBackend>, payload: SubmissionPayload) -> EvaluationResult {
  let task = tokio::spawn(async move { backend.evaluate(&payload).await });
  match task.await {
    Ok(result) => result,
    Err(e) => {
      error!(target: "evaluation", error = %e, "Evaluation task aborted");
      EvaluationResult::failure(EvaluationStatus::CriticalError, e.to_string())
    }
  }
}

#[derive(Clone)]
pub struct HttpEvaluationClient {
  pub client: reqwest::Client,
  pub base_url: String,
  pub timeout: Duration,
}

impl HttpEvaluationClient {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Ok(Self { client, base_url, timeout })
  }

  pub fn from_settings(s: &EvaluationSettings) -> Result<Self, reqwest::Error> {
    Self::new(s.base_url.clone(), Duration::from_secs(s.timeout_secs))
  }

  fn url(&self) -> String {
    format!("{}/submit_evaluation", self.base_url)
  }
}

#[async_trait]
impl EvaluationBackend for HttpEvaluationClient {
  #[instrument(
    level = "info",
    skip(self, payload),
    fields(problem = %payload.problem_title, user = %payload.user_name, code_len = payload.code.len(), tests = payload.examples.len())
  )]
  async fn evaluate(&self, payload: &SubmissionPayload) -> EvaluationResult {
    let req = EvaluationRequest {
      submission_id: Uuid::new_v4().to_string(),
      user_name: payload.user_name.clone(),
      problem_title: payload.problem_title.clone(),
      difficulty: payload.difficulty,
      user_code: payload.code.clone(),
      test_cases: payload.test_cases(),
    };

    let start = Instant::now();
    let sent = self.client.post(self.url())
      .header(USER_AGENT, "codecoach-sync/0.1")
      .header(CONTENT_TYPE, "application/json")
      .timeout(self.timeout)
      .json(&req)
      .send()
      .await;

    let res = match sent {
      Ok(res) => res,
      Err(e) => return transport_failure(&e, start.elapsed()),
    };

    let http_status = res.status();
    let body = match res.text().await {
      Ok(body) => body,
      Err(e) => return transport_failure(&e, start.elapsed()),
    };
    let elapsed = start.elapsed();

    if !http_status.is_success() {
      warn!(target: "evaluation", ?elapsed, status = http_status.as_u16(), body = %trunc_for_log(&body, 200), "Evaluation service returned non-success status");
      let mut out = EvaluationResult::failure(
        EvaluationStatus::HttpError,
        format!("evaluation service answered HTTP {}", http_status),
      );
      out.http_status = Some(http_status.as_u16());
      out.raw_body = Some(body);
      return out;
    }

    match serde_json::from_str::<EvaluationResponse>(&body) {
      Ok(parsed) => {
        let out = EvaluationResult::from_response(parsed);
        info!(
          target: "evaluation",
          ?elapsed,
          submission_id = %req.submission_id,
          status = out.status.as_str(),
          passed = out.passed_count,
          total = out.total_tests,
          solved = out.problem_solved,
          "Evaluation received"
        );
        out
      }
      Err(e) => {
        warn!(target: "evaluation", ?elapsed, error = %e, body_len = body.len(), "Evaluation response did not match the expected schema");
        let mut out = EvaluationResult::failure(EvaluationStatus::JsonError, format!("JSON parse error: {e}"));
        out.http_status = Some(http_status.as_u16());
        out.raw_body = Some(body);
        out
      }
    }
  }
}

fn transport_failure(e: &reqwest::Error, elapsed: Duration) -> EvaluationResult {
  // Connect timeouts report both flags; the deadline is what the user hit.
  let status = if e.is_timeout() {
    EvaluationStatus::TimeoutError
  } else if e.is_connect() {
    EvaluationStatus::ConnectionError
  } else {
    EvaluationStatus::CriticalError
  };
  error!(target: "evaluation", ?elapsed, error = %e, status = status.as_str(), "Evaluation request failed");
  EvaluationResult::failure(status, e.to_string())
}
