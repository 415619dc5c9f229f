//! Behaviors of the mock evaluation and feedback services.
//!
//! Neither compiles anything. The evaluator inspects the submission just enough
//! to produce each outcome the real judge can report, and the analyzer is
//! rule-based so it answers instantly.

use tracing::{debug, instrument};

use crate::domain::Difficulty;
use crate::protocol::{AnalyzeIn, AnalyzeOut, EvaluationRequest, EvaluationResponse, RemoteEvaluationStatus, TestCaseOut};

/// Points the mock judge awards for a solve.
pub fn points_for(difficulty: Difficulty) -> i64 {
  match difficulty {
    Difficulty::Easy => 10,
    Difficulty::Medium => 20,
    Difficulty::Hard => 30,
  }
}

fn empty_response(status: RemoteEvaluationStatus, message: impl Into<String>, total: u32) -> EvaluationResponse {
  EvaluationResponse {
    status,
    message: message.into(),
    summary: String::new(),
    passed_count: 0,
    total_tests: total,
    score: 0,
    problem_solved: false,
    tests: Vec::new(),
    compilation_output: String::new(),
    execution_output: String::new(),
    execution_time_ms: 0,
  }
}

/// - no `main` -> compile_error
/// - `abort(` anywhere -> runtime_error on the first test
/// - otherwise every test passes and the problem counts as solved
#[instrument(level = "info", skip(req), fields(problem = %req.problem_title, code_len = req.user_code.len(), tests = req.test_cases.len()))]
pub fn mock_evaluate(req: &EvaluationRequest) -> EvaluationResponse {
  let total = req.test_cases.len() as u32;

  if !req.user_code.contains("main") {
    let mut out = empty_response(RemoteEvaluationStatus::CompileError, "Compilation failed", total);
    out.summary = "Compilation failed".into();
    out.compilation_output = "error: undefined reference to `main'".into();
    return out;
  }

  if req.user_code.contains("abort(") {
    let mut out = empty_response(RemoteEvaluationStatus::RuntimeError, "Program aborted on test 1", total);
    out.summary = format!("0/{total} tests passed");
    out.execution_output = "terminate called: Aborted (core dumped)".into();
    if let Some(first) = req.test_cases.first() {
      out.tests.push(TestCaseOut {
        id: "1".into(),
        input: first.input_raw.clone(),
        obtained: String::new(),
        expected: first.expected_output_raw.clone(),
        passed: false,
      });
    }
    return out;
  }

  let tests: Vec<TestCaseOut> = req
    .test_cases
    .iter()
    .enumerate()
    .map(|(i, tc)| TestCaseOut {
      id: (i + 1).to_string(),
      input: tc.input_raw.clone(),
      obtained: tc.expected_output_raw.clone(),
      expected: tc.expected_output_raw.clone(),
      passed: true,
    })
    .collect();

  debug!(target: "evaluation", submission = %req.submission_id, total, "Mock judge accepted submission");
  EvaluationResponse {
    status: RemoteEvaluationStatus::Success,
    message: "All tests passed".into(),
    summary: format!("{total}/{total} tests passed"),
    passed_count: total,
    total_tests: total,
    score: points_for(req.difficulty),
    problem_solved: true,
    execution_output: tests.iter().map(|t| t.obtained.as_str()).collect::<Vec<_>>().join("\n"),
    tests,
    compilation_output: String::new(),
    execution_time_ms: 3 * u64::from(total),
  }
}

fn estimate_complexity(code: &str) -> &'static str {
  let lower = code.to_lowercase();
  let fors = code.matches("for").count();
  if fors >= 2 {
    "O(n²)"
  } else if fors == 1 || code.contains("while") {
    "O(n)"
  } else if lower.contains("recursion") || lower.contains("recursive") {
    "O(2^n)"
  } else {
    "O(1)"
  }
}

/// Rule-based review of `code` given the evaluation digest in `results`.
pub fn quick_analysis(code: &str, results: &str) -> String {
  let mut hints: Vec<&str> = Vec::new();

  if code.contains("cin >>") && !code.contains("using namespace std") {
    hints.push("🔍 Add #include <iostream> and using namespace std;");
  }
  if code.contains("vector") && !code.contains("#include <vector>") {
    hints.push("🔍 Include <vector>");
  }
  if code.contains("main()") && !code.contains("return 0") {
    hints.push("🔍 End main() with 'return 0;'");
  }

  let results = results.to_lowercase();
  if results.contains("error") {
    hints.push("⚠️ Your code has compilation or runtime errors");
  } else if results.contains("passed") && !results.contains("failed") {
    hints.push("✅ Excellent! Your code passes every test");
  } else {
    hints.push("🔧 Review the failing test cases");
  }

  let bullets = hints.iter().map(|h| format!("• {h}")).collect::<Vec<_>>().join("\n");
  format!(
    "🎯 QUICK ANALYSIS\n\n\
     📊 Estimated complexity: {}\n\n\
     💡 Suggestions:\n{}\n\n\
     🚀 Next steps:\n\
     • Check that your solution is optimal\n\
     • Try large inputs\n\
     • Consider edge cases\n",
    estimate_complexity(code),
    bullets
  )
}

#[instrument(level = "info", skip(input), fields(code_len = input.codigo_usuario.len(), lang = %input.lenguaje))]
pub fn analyze(input: &AnalyzeIn) -> AnalyzeOut {
  if input.codigo_usuario.trim().is_empty() {
    return AnalyzeOut {
      status: "error".into(),
      message: "The code is empty".into(),
      feedback_completo: "Please write some code before asking for an analysis.".into(),
    };
  }
  AnalyzeOut {
    status: "success".into(),
    message: "Quick analysis completed".into(),
    feedback_completo: quick_analysis(&input.codigo_usuario, &input.resultados_evaluacion),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::protocol::TestCaseIn;

  fn request(code: &str, difficulty: Difficulty) -> EvaluationRequest {
    EvaluationRequest {
      submission_id: "s-1".into(),
      user_name: "ana".into(),
      problem_title: "Two Sum".into(),
      difficulty,
      user_code: code.into(),
      test_cases: vec![
        TestCaseIn { input_raw: "1 2".into(), expected_output_raw: "3".into() },
        TestCaseIn { input_raw: "2 2".into(), expected_output_raw: "4".into() },
      ],
    }
  }

  #[test]
  fn judge_covers_each_remote_outcome() {
    let ok = mock_evaluate(&request("int main() { return 0; }", Difficulty::Medium));
    assert_eq!(ok.status, RemoteEvaluationStatus::Success);
    assert_eq!((ok.passed_count, ok.total_tests, ok.score), (2, 2, 20));
    assert!(ok.problem_solved);

    let ce = mock_evaluate(&request("int f() {}", Difficulty::Easy));
    assert_eq!(ce.status, RemoteEvaluationStatus::CompileError);
    assert!(!ce.problem_solved);
    assert!(ce.compilation_output.contains("main"));

    let re = mock_evaluate(&request("int main() { abort(); }", Difficulty::Hard));
    assert_eq!(re.status, RemoteEvaluationStatus::RuntimeError);
    assert_eq!(re.score, 0);
    assert!(!re.tests[0].passed);
  }

  #[test]
  fn complexity_heuristics() {
    assert_eq!(estimate_complexity("for(;;) for(;;)"), "O(n²)");
    assert_eq!(estimate_complexity("while (x) {}"), "O(n)");
    assert_eq!(estimate_complexity("// recursive helper"), "O(2^n)");
    assert_eq!(estimate_complexity("return 1;"), "O(1)");
  }

  #[test]
  fn analysis_reads_the_evaluation_digest() {
    let good = quick_analysis("int main() { return 0; }", "Status: success\nTests passed: 2/2");
    assert!(good.contains("Estimated complexity: O(1)"));
    assert!(good.contains("passes every test"));

    let bad = quick_analysis("int main() { }", "Status: runtime_error");
    assert!(bad.contains("return 0"));
    assert!(bad.contains("errors"));
  }

  #[test]
  fn empty_code_is_rejected() {
    let out = analyze(&AnalyzeIn {
      codigo_usuario: "   ".into(),
      resultados_evaluacion: String::new(),
      problema_enunciado: String::new(),
      lenguaje: "C++".into(),
    });
    assert_eq!(out.status, "error");
  }
}
