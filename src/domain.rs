//! Domain models: problems from the catalog and the per-user progress record.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Problem difficulty. Accepts the Spanish catalog labels as well.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
  #[serde(alias = "easy", alias = "Fácil", alias = "Facil")]
  Easy,
  #[serde(alias = "medium", alias = "Media", alias = "Medio")]
  Medium,
  #[serde(alias = "hard", alias = "Difícil", alias = "Dificil")]
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
    }
  }

  /// Sidebar marker used by the catalog listing.
  pub fn icon(&self) -> &'static str {
    match self {
      Difficulty::Easy => "🟢",
      Difficulty::Medium => "🟡",
      Difficulty::Hard => "🔴",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
  type Err = UnknownDifficulty;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "easy" | "fácil" | "facil" => Ok(Difficulty::Easy),
      "medium" | "media" | "medio" => Ok(Difficulty::Medium),
      "hard" | "difícil" | "dificil" => Ok(Difficulty::Hard),
      _ => Err(UnknownDifficulty(s.to_string())),
    }
  }
}

/// One example pair attached to a problem. The raw fields are what the
/// evaluation service runs; the pretty fields are display-only.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Example {
  pub input_raw: String,
  pub output_raw: String,
  #[serde(default)] pub input_pretty: Option<String>,
  #[serde(default)] pub output_pretty: Option<String>,
  #[serde(default)] pub explanation: Option<String>,
}

impl Example {
  pub fn new(input_raw: impl Into<String>, output_raw: impl Into<String>) -> Self {
    Self { input_raw: input_raw.into(), output_raw: output_raw.into(), ..Default::default() }
  }
}

/// A catalog problem, keyed by `title`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
  pub title: String,
  #[serde(default)] pub category: String,
  pub difficulty: Difficulty,
  #[serde(default)] pub statement: String,
  #[serde(default)] pub expected_complexity: String,
  #[serde(default)] pub examples: Vec<Example>,
}

impl Problem {
  /// `"🟢 Two Sum - Easy"`; reversed by `catalog::title_from_label`.
  pub fn display_label(&self) -> String {
    format!("{} {} - {}", self.difficulty.icon(), self.title, self.difficulty)
  }
}

/// Persistent per-user progress record.
///
/// Only the progress store mutates score, streak and counters, and only through
/// its conditional solve path. `problems_solved == solved_titles.len()` and
/// `best_streak >= current_streak` hold for every record it returns.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
  pub username: String,
  #[serde(skip_serializing, default)]
  pub credential: String,
  pub score: i64,
  pub problems_solved: u32,
  pub solved_titles: BTreeSet<String>,
  pub easy_solved: u32,
  pub medium_solved: u32,
  pub hard_solved: u32,
  pub current_streak: u32,
  pub best_streak: u32,
  pub last_access: DateTime<Utc>,
}

impl User {
  /// Zeroed record created at registration.
  pub fn new(username: impl Into<String>, credential: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      credential: credential.into(),
      score: 0,
      problems_solved: 0,
      solved_titles: BTreeSet::new(),
      easy_solved: 0,
      medium_solved: 0,
      hard_solved: 0,
      current_streak: 0,
      best_streak: 0,
      last_access: Utc::now(),
    }
  }

  pub fn has_solved(&self, title: &str) -> bool {
    self.solved_titles.contains(title)
  }

  pub fn solved_for(&self, difficulty: Difficulty) -> u32 {
    match difficulty {
      Difficulty::Easy => self.easy_solved,
      Difficulty::Medium => self.medium_solved,
      Difficulty::Hard => self.hard_solved,
    }
  }

  /// Labelled rows for a progress panel.
  pub fn stats_for_display(&self) -> Vec<(&'static str, String)> {
    vec![
      ("Total score", self.score.to_string()),
      ("Problems solved", self.problems_solved.to_string()),
      ("Current streak", self.current_streak.to_string()),
      ("Best streak", self.best_streak.to_string()),
      ("Easy solved", self.easy_solved.to_string()),
      ("Medium solved", self.medium_solved.to_string()),
      ("Hard solved", self.hard_solved.to_string()),
    ]
  }
}
