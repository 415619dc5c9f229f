//! codecoach-mock · stand-in evaluation and feedback services
//!
//! - Evaluation judge: POST /submit_evaluation
//! - Rule-based analyzer: POST /analyze_solution, GET /health
//!
//! Important env variables:
//!   EVALUATION_PORT : u16 (default 5000)
//!   FEEDBACK_PORT   : u16 (default 8000)
//!   BIND_ADDR       : default "127.0.0.1"
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, instrument};

use codecoach_sync::routes::{build_evaluation_router, build_feedback_router};
use codecoach_sync::telemetry;

fn addr_from_env(port_var: &str, default_port: u16) -> SocketAddr {
  let ip = std::env::var("BIND_ADDR")
    .ok()
    .and_then(|s| s.parse::<IpAddr>().ok())
    .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
  let port = std::env::var(port_var)
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(default_port);
  SocketAddr::new(ip, port)
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
  let _ = rx.changed().await;
}

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let eval_addr = addr_from_env("EVALUATION_PORT", 5000);
  let feedback_addr = addr_from_env("FEEDBACK_PORT", 8000);

  let eval_listener = TcpListener::bind(eval_addr).await?;
  let feedback_listener = TcpListener::bind(feedback_addr).await?;
  info!(target: "codecoach", %eval_addr, "Mock evaluation service listening");
  info!(target: "codecoach", %feedback_addr, "Mock feedback service listening");

  let (tx, rx) = watch::channel(false);
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!(target: "codecoach", "Ctrl-C received; shutting down");
    }
    let _ = tx.send(true);
  });

  let eval = axum::serve(eval_listener, build_evaluation_router())
    .with_graceful_shutdown(wait_for_shutdown(rx.clone()));
  let feedback = axum::serve(feedback_listener, build_feedback_router())
    .with_graceful_shutdown(wait_for_shutdown(rx));

  tokio::try_join!(async { eval.await }, async { feedback.await })?;
  Ok(())
}
