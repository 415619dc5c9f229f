//! Loading client configuration (service endpoints, retry policy, store, catalog) from TOML.
//!
//! The file is optional: `CODECOACH_CONFIG_PATH` names it, and environment variables
//! override individual knobs afterwards. See `CoachConfig` for the expected schema.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::Problem;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CoachConfig {
  #[serde(default)]
  pub evaluation: EvaluationSettings,
  #[serde(default)]
  pub feedback: FeedbackSettings,
  #[serde(default)]
  pub store: StoreSettings,
  /// Extra catalog entries; same-titled entries replace the built-in seeds.
  #[serde(default)]
  pub problems: Vec<Problem>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
  pub base_url: String,
  pub timeout_secs: u64,
}

impl Default for EvaluationSettings {
  fn default() -> Self {
    Self { base_url: "http://127.0.0.1:5000".into(), timeout_secs: 30 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
  pub base_url: String,
  /// Attempt `i` (0-based) is granted `base_timeout_secs * (i + 1)`.
  pub base_timeout_secs: u64,
  pub max_attempts: u32,
  pub check_health: bool,
  pub language: String,
  /// Cap on the evaluation digest sent as `resultados_evaluacion`.
  pub digest_max_chars: usize,
}

impl Default for FeedbackSettings {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:8000".into(),
      base_timeout_secs: 30,
      max_attempts: 2,
      check_health: false,
      language: "C++".into(),
      digest_max_chars: 2000,
    }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct StoreSettings {
  /// SQLite file for durable progress; unset keeps progress in memory.
  pub db_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Io { path: String, #[source] source: std::io::Error },
  #[error("failed to parse TOML: {0}")]
  Parse(#[from] toml::de::Error),
}

pub fn parse_config(text: &str) -> Result<CoachConfig, ConfigError> {
  Ok(toml::from_str::<CoachConfig>(text)?)
}

pub fn load_config_file(path: &str) -> Result<CoachConfig, ConfigError> {
  let text = std::fs::read_to_string(path)
    .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
  parse_config(&text)
}

/// File from CODECOACH_CONFIG_PATH (if any) plus environment overrides.
/// A broken file is logged and replaced by defaults rather than aborting startup.
pub fn load_config_from_env() -> CoachConfig {
  let mut cfg = match std::env::var("CODECOACH_CONFIG_PATH") {
    Ok(path) => match load_config_file(&path) {
      Ok(cfg) => {
        info!(target: "codecoach", %path, problems = cfg.problems.len(), "Loaded client config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "codecoach", %path, error = %e, "Failed to load TOML config; using defaults");
        CoachConfig::default()
      }
    },
    Err(_) => CoachConfig::default(),
  };
  cfg.apply_overrides(|key| std::env::var(key).ok());
  cfg
}

impl CoachConfig {
  /// Apply `KEY=value` overrides from `lookup`. Unparseable numbers are ignored with a warning.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("EVALUATION_BASE_URL") { self.evaluation.base_url = v; }
    if let Some(v) = parsed(&lookup, "EVALUATION_TIMEOUT_SECS") { self.evaluation.timeout_secs = v; }
    if let Some(v) = lookup("FEEDBACK_BASE_URL") { self.feedback.base_url = v; }
    if let Some(v) = parsed(&lookup, "FEEDBACK_BASE_TIMEOUT_SECS") { self.feedback.base_timeout_secs = v; }
    if let Some(v) = parsed(&lookup, "FEEDBACK_MAX_ATTEMPTS") { self.feedback.max_attempts = v; }
    if let Some(v) = parsed(&lookup, "FEEDBACK_CHECK_HEALTH") { self.feedback.check_health = v; }
    if let Some(v) = lookup("PROGRESS_DB_PATH") { self.store.db_path = Some(PathBuf::from(v)); }
  }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
  let raw = lookup(key)?;
  match raw.trim().parse::<T>() {
    Ok(v) => Some(v),
    Err(_) => {
      warn!(target: "codecoach", %key, value = %raw, "Ignoring unparseable override");
      None
    }
  }
}
