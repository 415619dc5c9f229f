//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,feedback=debug,progress=debug,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets are part of the output: `evaluation`, `feedback`, `progress`,
//! `catalog` and `codecoach` name the subsystem a line came from.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "info,codecoach=debug,evaluation=debug,feedback=debug,progress=debug,catalog=info,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // try_init: a host application may already have installed a subscriber.
    let installed = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
    if installed.is_err() {
        tracing::debug!(target: "codecoach", "Global tracing subscriber already set; keeping it");
    }
}
