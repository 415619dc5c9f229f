//! CodeCoach client core: submission packaging, remote evaluation, AI feedback
//! with escalating retries, and idempotent progress synchronization.
//!
//! The crate also ships the mock evaluation and feedback services (`routes`)
//! used by the `codecoach-mock` binary and by the HTTP client tests.
//!
//! Important env variables:
//!   CODECOACH_CONFIG_PATH      : TOML file (see `config::CoachConfig`)
//!   EVALUATION_BASE_URL        : default "http://127.0.0.1:5000"
//!   EVALUATION_TIMEOUT_SECS    : default 30
//!   FEEDBACK_BASE_URL          : default "http://127.0.0.1:8000"
//!   FEEDBACK_BASE_TIMEOUT_SECS : default 30 (attempt i gets base * (i + 1))
//!   FEEDBACK_MAX_ATTEMPTS      : default 2
//!   FEEDBACK_CHECK_HEALTH      : default false
//!   PROGRESS_DB_PATH           : SQLite file; unset keeps progress in memory
//!   LOG_LEVEL / LOG_FORMAT     : tracing filter and "pretty" | "json"

pub mod telemetry;
pub mod util;
pub mod domain;
pub mod config;
pub mod seeds;
pub mod catalog;
pub mod protocol;
pub mod packager;
pub mod evaluation;
pub mod feedback;
pub mod progress;
pub mod auth;
pub mod sqlite;
pub mod ranking;
pub mod pipeline;
pub mod logic;
pub mod routes;

pub use auth::{CredentialVerifier, Sha256Verifier};
pub use catalog::{MemoryCatalog, ProblemCatalog};
pub use domain::{Difficulty, Example, Problem, User};
pub use evaluation::{EvaluationBackend, EvaluationResult, EvaluationStatus};
pub use feedback::{FeedbackBackend, FeedbackResult, FeedbackStatus, RetryPolicy};
pub use packager::{pack, SubmissionPayload, ValidationError};
pub use pipeline::{EventInbox, Pipeline, PipelineEvent, Ticket};
pub use progress::{PersistenceError, ProgressStore, ProgressSynchronizer, SolveOutcome};
pub use ranking::{top_n, RankingEntry};
