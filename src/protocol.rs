//! Wire DTOs for the evaluation and feedback services (serde ready).
//! Both the HTTP clients and the mock services speak these shapes, so keep
//! field names stable: the remote services were written against them.

use serde::{Deserialize, Serialize};

use crate::domain::Difficulty;

//
// Evaluation service: POST /submit_evaluation
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub submission_id: String,
    pub user_name: String,
    pub problem_title: String,
    pub difficulty: Difficulty,
    pub user_code: String,
    pub test_cases: Vec<TestCaseIn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCaseIn {
    pub input_raw: String,
    pub expected_output_raw: String,
}

/// Outcomes the evaluator itself may report. Anything else is a contract mismatch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoteEvaluationStatus {
    Success,
    CompileError,
    RuntimeError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub status: RemoteEvaluationStatus,
    pub message: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub passed_count: u32,
    #[serde(default)]
    pub total_tests: u32,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub problem_solved: bool,
    #[serde(default)]
    pub tests: Vec<TestCaseOut>,
    #[serde(default)]
    pub compilation_output: String,
    #[serde(default)]
    pub execution_output: String,
    #[serde(default)]
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCaseOut {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub obtained: String,
    #[serde(default)]
    pub expected: String,
    pub passed: bool,
}

//
// Feedback service: POST /analyze_solution, GET /health
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeIn {
    pub codigo_usuario: String,
    pub resultados_evaluacion: String,
    pub problema_enunciado: String,
    #[serde(default = "default_language")]
    pub lenguaje: String,
}

fn default_language() -> String {
    "C++".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeOut {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub feedback_completo: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthOut {
    pub status: String,
    pub model: String,
}
