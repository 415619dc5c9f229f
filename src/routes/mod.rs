//! Router assembly for the mock services: endpoints, CORS, and HTTP tracing.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod http;

/// Mock evaluation service: `POST /submit_evaluation`.
pub fn build_evaluation_router() -> Router {
    with_layers(
        Router::new()
            .route("/submit_evaluation", post(http::http_submit_evaluation))
            .route("/health", get(http::http_evaluation_health)),
    )
}

/// Mock feedback service: `POST /analyze_solution`, `GET /health`.
pub fn build_feedback_router() -> Router {
    with_layers(
        Router::new()
            .route("/", get(http::http_feedback_root))
            .route("/health", get(http::http_feedback_health))
            .route("/analyze_solution", post(http::http_analyze_solution)),
    )
}

/// CORS (allow any origin/method/headers) plus per-request trace spans.
fn with_layers(router: Router) -> Router {
    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
