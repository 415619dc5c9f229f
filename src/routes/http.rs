//! HTTP endpoint handlers. These are thin wrappers that forward to `logic`.

use axum::{response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::logic::{analyze, mock_evaluate};
use crate::protocol::*;

#[instrument(level = "info", skip(body), fields(problem = %body.problem_title, user = %body.user_name))]
pub async fn http_submit_evaluation(Json(body): Json<EvaluationRequest>) -> impl IntoResponse {
  let out = mock_evaluate(&body);
  info!(target: "evaluation", submission = %body.submission_id, status = ?out.status, score = out.score, "Mock evaluation served");
  Json(out)
}

#[instrument(level = "info")]
pub async fn http_evaluation_health() -> impl IntoResponse {
  Json(HealthOut { status: "ready".into(), model: "mock-judge".into() })
}

#[instrument(level = "info")]
pub async fn http_feedback_root() -> impl IntoResponse {
  Json(serde_json::json!({ "message": "Quick analysis API active", "status": "ready" }))
}

#[instrument(level = "info")]
pub async fn http_feedback_health() -> impl IntoResponse {
  Json(HealthOut { status: "ready".into(), model: "fast-analyzer".into() })
}

#[instrument(level = "info", skip(body), fields(code_len = body.codigo_usuario.len()))]
pub async fn http_analyze_solution(Json(body): Json<AnalyzeIn>) -> impl IntoResponse {
  let out = analyze(&body);
  info!(target: "feedback", status = %out.status, feedback_len = out.feedback_completo.len(), "Mock analysis served");
  Json(out)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt;

  use crate::protocol::{AnalyzeOut, EvaluationResponse, HealthOut, RemoteEvaluationStatus};
  use crate::routes::{build_evaluation_router, build_feedback_router};

  async fn body_json<T: serde::de::DeserializeOwned>(res: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  #[tokio::test]
  async fn submit_evaluation_scores_by_difficulty() {
    let req = post_json("/submit_evaluation", serde_json::json!({
      "submission_id": "s-1",
      "user_name": "ana",
      "problem_title": "Merge K Sorted Lists",
      "difficulty": "Hard",
      "user_code": "int main() { return 0; }",
      "test_cases": [{ "input_raw": "0", "expected_output_raw": "" }]
    }));
    let res = build_evaluation_router().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let out: EvaluationResponse = body_json(res).await;
    assert_eq!(out.status, RemoteEvaluationStatus::Success);
    assert_eq!(out.score, 30);
    assert_eq!(out.total_tests, 1);
  }

  #[tokio::test]
  async fn malformed_submission_is_rejected_by_the_extractor() {
    let req = post_json("/submit_evaluation", serde_json::json!({ "code": "x" }));
    let res = build_evaluation_router().oneshot(req).await.unwrap();
    assert!(res.status().is_client_error());
  }

  #[tokio::test]
  async fn analyzer_answers_and_reports_health() {
    let req = post_json("/analyze_solution", serde_json::json!({
      "codigo_usuario": "int main() { for (;;) {} }",
      "resultados_evaluacion": "Status: success",
      "problema_enunciado": "Sum two numbers."
    }));
    let res = build_feedback_router().oneshot(req).await.unwrap();
    let out: AnalyzeOut = body_json(res).await;
    assert_eq!(out.status, "success");
    assert!(out.feedback_completo.contains("Estimated complexity: O(n)"));

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let res = build_feedback_router().oneshot(health).await.unwrap();
    let h: HealthOut = body_json(res).await;
    assert_eq!(h.status, "ready");
  }

  #[tokio::test]
  async fn analyzer_flags_empty_code() {
    let req = post_json("/analyze_solution", serde_json::json!({
      "codigo_usuario": "",
      "resultados_evaluacion": "",
      "problema_enunciado": ""
    }));
    let res = build_feedback_router().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let out: AnalyzeOut = body_json(res).await;
    assert_eq!(out.status, "error");
  }
}
