//! Leaderboard: a read-only view over the progress store.

use serde::Serialize;
use tracing::instrument;

use crate::progress::{PersistenceError, ProgressStore};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankingEntry {
  /// 1-based.
  pub rank: usize,
  pub username: String,
  pub score: i64,
  pub problems_solved: u32,
}

/// Top `limit` users by score. Ordering of ties is whatever the store reports.
#[instrument(level = "debug", skip(store))]
pub async fn top_n(store: &dyn ProgressStore, limit: usize) -> Result<Vec<RankingEntry>, PersistenceError> {
  let users = store.top_by_score(limit).await?;
  Ok(
    users
      .into_iter()
      .take(limit)
      .enumerate()
      .map(|(i, u)| RankingEntry {
        rank: i + 1,
        username: u.username,
        score: u.score,
        problems_solved: u.problems_solved,
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;
  use crate::progress::{MemoryProgressStore, NullProgressStore};

  #[tokio::test]
  async fn ranks_are_dense_and_score_ordered() {
    let store = MemoryProgressStore::new();
    for name in ["ana", "bob", "cy", "dee"] {
      store.register(name, "c").await.unwrap();
    }
    store.record_solve("bob", "A", Difficulty::Hard, 30).await.unwrap();
    store.record_solve("ana", "A", Difficulty::Easy, 10).await.unwrap();
    store.record_solve("cy", "A", Difficulty::Easy, 10).await.unwrap();
    store.record_solve("cy", "B", Difficulty::Easy, 10).await.unwrap();

    let top = top_n(&store, 10).await.unwrap();
    let rows: Vec<_> = top.iter().map(|e| (e.rank, e.username.as_str(), e.score)).collect();
    assert_eq!(rows, vec![(1, "bob", 30), (2, "cy", 20), (3, "ana", 10)]);
    assert_eq!(top[1].problems_solved, 2);

    assert_eq!(top_n(&store, 2).await.unwrap().len(), 2);
    assert!(top_n(&store, 0).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn store_errors_propagate() {
    assert!(matches!(top_n(&NullProgressStore, 5).await, Err(PersistenceError::Unavailable(_))));
  }
}
