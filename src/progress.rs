//! Per-user progress: the store contract and the synchronizer that applies solves.
//!
//! A solve is applied by the store as one conditional update guarded by
//! "title not yet in solved_titles". Clients never read-modify-write a record,
//! so concurrent submissions for the same user cannot double count.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use crate::domain::{Difficulty, User};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
  #[error("progress store unavailable: {0}")]
  Unavailable(String),
  #[error("no progress record for user '{0}'")]
  UserNotFound(String),
  #[error("user '{0}' already exists")]
  DuplicateUser(String),
  #[error("progress store error: {0}")]
  Storage(String),
}

/// Outcome of a solve. `applied == false` means the title was already solved
/// and `user` is the unchanged record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SolveOutcome {
  pub applied: bool,
  pub user: User,
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
  async fn register(&self, username: &str, credential: &str) -> Result<User, PersistenceError>;

  async fn user(&self, username: &str) -> Result<Option<User>, PersistenceError>;

  /// Stamp `last_access` (login path).
  async fn touch_access(&self, username: &str) -> Result<(), PersistenceError>;

  /// Atomically record a first-time solve; a repeat is a no-op returning `applied = false`.
  async fn record_solve(
    &self,
    username: &str,
    title: &str,
    difficulty: Difficulty,
    points: i64,
  ) -> Result<SolveOutcome, PersistenceError>;

  /// Users with a positive score, highest first; ties keep registration order.
  async fn top_by_score(&self, limit: usize) -> Result<Vec<User>, PersistenceError>;
}

/// In-process store. One lock guards every record, which makes each
/// `record_solve` a single atomic step.
#[derive(Default)]
pub struct MemoryProgressStore {
  inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
  users: HashMap<String, User>,
  order: Vec<String>,
}

impl MemoryProgressStore {
  pub fn new() -> Self {
    Self::default()
  }
}

/// The solve rule shared by stores that can mutate a record in place under a lock.
pub(crate) fn apply_solve(user: &mut User, title: &str, difficulty: Difficulty, points: i64) -> bool {
  if user.solved_titles.contains(title) {
    return false;
  }
  // points come from a remote evaluator; saturate rather than wrap or panic
  user.score = user.score.saturating_add(points.max(0));
  user.solved_titles.insert(title.to_string());
  user.problems_solved += 1;
  user.current_streak += 1;
  match difficulty {
    Difficulty::Easy => user.easy_solved += 1,
    Difficulty::Medium => user.medium_solved += 1,
    Difficulty::Hard => user.hard_solved += 1,
  }
  if user.current_streak > user.best_streak {
    user.best_streak = user.current_streak;
  }
  user.last_access = Utc::now();
  true
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
  async fn register(&self, username: &str, credential: &str) -> Result<User, PersistenceError> {
    let mut inner = self.inner.lock().await;
    if inner.users.contains_key(username) {
      return Err(PersistenceError::DuplicateUser(username.to_string()));
    }
    let user = User::new(username, credential);
    inner.users.insert(username.to_string(), user.clone());
    inner.order.push(username.to_string());
    Ok(user)
  }

  async fn user(&self, username: &str) -> Result<Option<User>, PersistenceError> {
    Ok(self.inner.lock().await.users.get(username).cloned())
  }

  async fn touch_access(&self, username: &str) -> Result<(), PersistenceError> {
    let mut inner = self.inner.lock().await;
    let user = inner.users.get_mut(username)
      .ok_or_else(|| PersistenceError::UserNotFound(username.to_string()))?;
    user.last_access = Utc::now();
    Ok(())
  }

  async fn record_solve(
    &self,
    username: &str,
    title: &str,
    difficulty: Difficulty,
    points: i64,
  ) -> Result<SolveOutcome, PersistenceError> {
    let mut inner = self.inner.lock().await;
    let user = inner.users.get_mut(username)
      .ok_or_else(|| PersistenceError::UserNotFound(username.to_string()))?;
    let applied = apply_solve(user, title, difficulty, points);
    Ok(SolveOutcome { applied, user: user.clone() })
  }

  async fn top_by_score(&self, limit: usize) -> Result<Vec<User>, PersistenceError> {
    let inner = self.inner.lock().await;
    let mut ranked: Vec<User> = inner.order
      .iter()
      .filter_map(|name| inner.users.get(name))
      .filter(|u| u.score > 0)
      .cloned()
      .collect();
    // stable: equal scores stay in registration order
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(limit);
    Ok(ranked)
  }
}

/// Stand-in when no store could be opened. Every call is `Unavailable`.
#[derive(Clone, Debug, Default)]
pub struct NullProgressStore;

#[async_trait]
impl ProgressStore for NullProgressStore {
  async fn register(&self, _username: &str, _credential: &str) -> Result<User, PersistenceError> {
    Err(PersistenceError::Unavailable("no progress store configured".into()))
  }

  async fn user(&self, _username: &str) -> Result<Option<User>, PersistenceError> {
    Err(PersistenceError::Unavailable("no progress store configured".into()))
  }

  async fn touch_access(&self, _username: &str) -> Result<(), PersistenceError> {
    Err(PersistenceError::Unavailable("no progress store configured".into()))
  }

  async fn record_solve(&self, _: &str, _: &str, _: Difficulty, _: i64) -> Result<SolveOutcome, PersistenceError> {
    Err(PersistenceError::Unavailable("no progress store configured".into()))
  }

  async fn top_by_score(&self, _limit: usize) -> Result<Vec<User>, PersistenceError> {
    Err(PersistenceError::Unavailable("no progress store configured".into()))
  }
}

/// The only writer of score/streak/counters.
#[derive(Clone)]
pub struct ProgressSynchronizer {
  store: Arc<dyn ProgressStore>,
}

impl ProgressSynchronizer {
  pub fn new(store: Arc<dyn ProgressStore>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &Arc<dyn ProgressStore> {
    &self.store
  }

  /// Apply a solved evaluation. A store failure here means the learner was told
  /// "solved" but the points are not saved, so it is logged as an error.
  #[instrument(level = "info", skip_all, fields(%username, %title, %difficulty, points))]
  pub async fn record_solve(
    &self,
    username: &str,
    title: &str,
    difficulty: Difficulty,
    points: i64,
  ) -> Result<SolveOutcome, PersistenceError> {
    let points = points.max(0);
    match self.store.record_solve(username, title, difficulty, points).await {
      Ok(outcome) => {
        if outcome.applied {
          info!(
            target: "progress",
            %username, %title, points,
            score = outcome.user.score,
            streak = outcome.user.current_streak,
            "Progress updated"
          );
        } else {
          info!(target: "progress", %username, %title, "Already solved; score unchanged");
        }
        Ok(outcome)
      }
      Err(e) => {
        error!(target: "progress", %username, %title, points, error = %e, "Evaluation succeeded but progress was not saved");
        Err(e)
      }
    }
  }
}
