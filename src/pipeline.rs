//! Submission pipeline: pack -> evaluate -> sync progress -> feedback.
//!
//! `Pipeline::submit` is safe to call from a UI thread: it validates and packs
//! synchronously, then moves everything else onto the tokio runtime and
//! returns a `Ticket`. Results come back as `PipelineEvent`s on an unbounded
//! channel which the UI drains through `EventInbox` without blocking.
//!
//! Tickets increase monotonically. Feedback for a submission that has since
//! been superseded is dropped by the inbox; evaluation and progress events are
//! always delivered because they report state that already changed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{self, CredentialVerifier, Sha256Verifier};
use crate::config::{CoachConfig, FeedbackSettings};
use crate::domain::{Problem, User};
use crate::evaluation::{evaluate_guarded, EvaluationBackend, EvaluationResult, HttpEvaluationClient, NullEvaluationBackend};
use crate::feedback::{
    FeedbackBackend, FeedbackRequest, FeedbackResult, FeedbackWorker, HttpFeedbackClient, NullFeedbackBackend,
    RetryPolicy,
};
use crate::packager::{pack, ValidationError};
use crate::progress::{
    MemoryProgressStore, NullProgressStore, PersistenceError, ProgressStore, ProgressSynchronizer, SolveOutcome,
};
use crate::ranking::{top_n, RankingEntry};
use crate::sqlite::SqliteProgressStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Evaluated { ticket: Ticket, result: EvaluationResult },
    ProgressSaved { ticket: Ticket, outcome: SolveOutcome },
    /// The evaluation solved the problem but the points were not stored.
    ProgressFailed { ticket: Ticket, error: String },
    Feedback { ticket: Ticket, result: FeedbackResult },
}

impl PipelineEvent {
    pub fn ticket(&self) -> Ticket {
        match self {
            PipelineEvent::Evaluated { ticket, .. }
            | PipelineEvent::ProgressSaved { ticket, .. }
            | PipelineEvent::ProgressFailed { ticket, .. }
            | PipelineEvent::Feedback { ticket, .. } => *ticket,
        }
    }
}

/// UI side of the event channel.
pub struct EventInbox {
    rx: UnboundedReceiver<PipelineEvent>,
    latest: Arc<AtomicU64>,
}

impl EventInbox {
    fn is_stale(&self, ev: &PipelineEvent) -> bool {
        matches!(ev, PipelineEvent::Feedback { .. }) && ev.ticket().0 < self.latest.load(Ordering::SeqCst)
    }

    /// Next deliverable event, if one is queued. Never blocks.
    pub fn try_next(&mut self) -> Option<PipelineEvent> {
        while let Ok(ev) = self.rx.try_recv() {
            if self.is_stale(&ev) {
                debug!(target: "codecoach", ticket = %ev.ticket(), "Dropping superseded feedback");
                continue;
            }
            return Some(ev);
        }
        None
    }

    /// Everything currently queued, stale feedback removed. For a UI timer tick.
    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Await the next deliverable event. `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<PipelineEvent> {
        loop {
            let ev = self.rx.recv().await?;
            if self.is_stale(&ev) {
                debug!(target: "codecoach", ticket = %ev.ticket(), "Dropping superseded feedback");
                continue;
            }
            return Some(ev);
        }
    }
}

pub struct Pipeline {
    evaluator: Arc<dyn EvaluationBackend>,
    progress: ProgressSynchronizer,
    verifier: Arc<dyn CredentialVerifier>,
    feedback: FeedbackWorker,
    language: String,
    digest_max_chars: usize,
    runtime: Handle,
    next_ticket: AtomicU64,
    latest: Arc<AtomicU64>,
    events: UnboundedSender<PipelineEvent>,
}

impl Pipeline {
    pub fn new(
        evaluator: Arc<dyn EvaluationBackend>,
        feedback: Arc<dyn FeedbackBackend>,
        store: Arc<dyn ProgressStore>,
        settings: &FeedbackSettings,
        runtime: Handle,
    ) -> (Self, EventInbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let latest = Arc::new(AtomicU64::new(0));
        let pipeline = Self {
            evaluator,
            progress: ProgressSynchronizer::new(store),
            verifier: Arc::new(Sha256Verifier),
            feedback: FeedbackWorker::new(feedback, RetryPolicy::from_settings(settings)),
            language: settings.language.clone(),
            digest_max_chars: settings.digest_max_chars,
            runtime,
            next_ticket: AtomicU64::new(1),
            latest: latest.clone(),
            events: tx,
        };
        (pipeline, EventInbox { rx, latest })
    }

    /// Wire real clients from config. Any collaborator that cannot be built is
    /// replaced by its null implementation, so the pipeline always starts.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &CoachConfig, runtime: Handle) -> (Self, EventInbox) {
        let evaluator: Arc<dyn EvaluationBackend> = match HttpEvaluationClient::from_settings(&cfg.evaluation) {
            Ok(c) => {
                info!(target: "codecoach", base_url = %cfg.evaluation.base_url, timeout_secs = cfg.evaluation.timeout_secs, "Evaluation client ready");
                Arc::new(c)
            }
            Err(e) => {
                error!(target: "codecoach", error = %e, "Evaluation client unavailable; submissions will report connection_error");
                Arc::new(NullEvaluationBackend)
            }
        };

        let feedback: Arc<dyn FeedbackBackend> = match HttpFeedbackClient::from_settings(&cfg.feedback) {
            Ok(c) => {
                info!(target: "codecoach", base_url = %cfg.feedback.base_url, max_attempts = cfg.feedback.max_attempts, "Feedback client ready");
                Arc::new(c)
            }
            Err(e) => {
                error!(target: "codecoach", error = %e, "Feedback client unavailable");
                Arc::new(NullFeedbackBackend)
            }
        };

        let store: Arc<dyn ProgressStore> = match &cfg.store.db_path {
            Some(path) => match SqliteProgressStore::open(path) {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    error!(target: "codecoach", path = %path.display(), error = %e, "Progress store unavailable; progress will not be saved");
                    Arc::new(NullProgressStore)
                }
            },
            None => {
                warn!(target: "codecoach", "PROGRESS_DB_PATH not set; progress kept in memory only");
                Arc::new(MemoryProgressStore::new())
            }
        };

        Self::new(evaluator, feedback, store, &cfg.feedback, runtime)
    }

    /// Replace the default SHA-256 credential verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        self.progress.store()
    }

    pub async fn register(&self, username: &str, credential: &str) -> Result<User, PersistenceError> {
        auth::register(self.progress.store().as_ref(), self.verifier.as_ref(), username, credential).await
    }

    /// `Ok(false)` for a blank, unknown or wrong login; `last_access` moves on success.
    pub async fn login(&self, username: &str, credential: &str) -> Result<bool, PersistenceError> {
        auth::validate_login(self.progress.store().as_ref(), self.verifier.as_ref(), username, credential).await
    }

    /// Ticket of the most recent accepted submission.
    pub fn latest_ticket(&self) -> Option<Ticket> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(Ticket(n)),
        }
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<RankingEntry>, PersistenceError> {
        top_n(self.progress.store().as_ref(), limit).await
    }

    /// Validate and dispatch a submission. Validation errors return before any
    /// network work and do not consume a ticket.
    #[instrument(level = "info", skip(self, code, problem), fields(code_len = code.len(), problem = problem.map(|p| p.title.as_str()).unwrap_or("")))]
    pub fn submit(&self, code: &str, problem: Option<&Problem>, user: Option<&str>) -> Result<Ticket, ValidationError> {
        let payload = pack(code, problem, user)?;
        let ticket = Ticket(self.next_ticket.fetch_add(1, Ordering::SeqCst));
        self.latest.fetch_max(ticket.0, Ordering::SeqCst);
        info!(target: "codecoach", %ticket, user = %payload.user_name, problem = %payload.problem_title, tests = payload.examples.len(), "Submission accepted");

        let evaluator = self.evaluator.clone();
        let progress = self.progress.clone();
        let feedback = self.feedback.clone();
        let language = self.language.clone();
        let digest_max_chars = self.digest_max_chars;
        let runtime = self.runtime.clone();
        let tx = self.events.clone();

        self.runtime.spawn(async move {
            let result = evaluate_guarded(evaluator, payload.clone()).await;
            info!(target: "codecoach", %ticket, status = result.status.as_str(), solved = result.is_solved(), score = result.score, "Evaluation finished");
            let _ = tx.send(PipelineEvent::Evaluated { ticket, result: result.clone() });

            if result.is_solved() && !payload.is_guest() {
                let (user, title, difficulty, points) =
                    (payload.user_name.clone(), payload.problem_title.clone(), payload.difficulty, result.score);
                // a panicking store must not take the feedback stage down with it
                let sync = runtime.spawn(async move { progress.record_solve(&user, &title, difficulty, points).await });
                let ev = match sync.await {
                    Ok(Ok(outcome)) => PipelineEvent::ProgressSaved { ticket, outcome },
                    Ok(Err(e)) => PipelineEvent::ProgressFailed { ticket, error: e.to_string() },
                    Err(join) => {
                        error!(target: "progress", %ticket, user = %payload.user_name, error = %join, "Progress store crashed; points not saved");
                        PipelineEvent::ProgressFailed { ticket, error: format!("progress store crashed: {join}") }
                    }
                };
                let _ = tx.send(ev);
            }

            if result.status.is_semantic() {
                let req = FeedbackRequest::from_evaluation(&payload, &result, &language, digest_max_chars);
                feedback.spawn(&runtime, req, move |result| {
                    let _ = tx.send(PipelineEvent::Feedback { ticket, result });
                });
            } else {
                debug!(target: "codecoach", %ticket, status = result.status.as_str(), class = result.status.class(), "No feedback for this failure");
            }
        });

        Ok(ticket)
    }
}
