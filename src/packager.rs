//! Turns raw editor contents plus the selected problem into an evaluation payload.
//!
//! Packaging is a pure transform: it validates before any network work and
//! snapshots the problem so later catalog edits cannot leak into an in-flight
//! submission. All examples are copied; the evaluation service owns any cap.

use serde::Serialize;

use crate::domain::{Difficulty, Example, Problem};
use crate::protocol::TestCaseIn;

/// Identity used when no session is active.
pub const GUEST_USER: &str = "guest";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("the code editor is empty")]
  EmptyCode,
  #[error("select a problem before submitting")]
  NoProblemSelected,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubmissionPayload {
  pub user_name: String,
  pub code: String,
  pub problem_title: String,
  pub difficulty: Difficulty,
  pub problem_statement: String,
  pub examples: Vec<Example>,
}

impl SubmissionPayload {
  pub fn is_guest(&self) -> bool {
    self.user_name == GUEST_USER
  }

  /// The (input, expected output) pairs the evaluator runs.
  pub fn test_cases(&self) -> Vec<TestCaseIn> {
    self.examples
      .iter()
      .map(|e| TestCaseIn {
        input_raw: e.input_raw.clone(),
        expected_output_raw: e.output_raw.clone(),
      })
      .collect()
  }
}

pub fn pack(
  code: &str,
  problem: Option<&Problem>,
  user_name: Option<&str>,
) -> Result<SubmissionPayload, ValidationError> {
  if code.trim().is_empty() {
    return Err(ValidationError::EmptyCode);
  }
  let problem = problem.ok_or(ValidationError::NoProblemSelected)?;

  let user_name = match user_name.map(str::trim) {
    Some(name) if !name.is_empty() => name.to_string(),
    _ => GUEST_USER.to_string(),
  };

  Ok(SubmissionPayload {
    user_name,
    code: code.to_string(),
    problem_title: problem.title.clone(),
    difficulty: problem.difficulty,
    problem_statement: problem.statement.clone(),
    examples: problem.examples.clone(),
  })
}
