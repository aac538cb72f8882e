//! Ghost-Job Checker — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the analyze route, shared state, CORS,
//! and the Prometheus exporter.

use shuttle_axum::ShuttleAxum;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ghost_job_checker::api::AppState;
use ghost_job_checker::create_router;
use ghost_job_checker::fetch::FETCH_TIMEOUT;
use ghost_job_checker::metrics::Metrics;
use ghost_job_checker::score::{
    start_hot_reload_thread, DEFAULT_SCORING_CONFIG_PATH, ENV_SCORING_CONFIG_PATH,
};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - GHOSTJOB_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("GHOSTJOB_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("analyze=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // --- Scoring tables + optional dev hot reload ---
    let state = AppState::production().expect("Failed to build app state");
    let path = std::env::var(ENV_SCORING_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCORING_CONFIG_PATH));
    start_hot_reload_thread(state.scoring.clone(), path);

    // --- Prometheus exporter (kept off the test router) ---
    let metrics = Metrics::init(FETCH_TIMEOUT.as_millis() as u64);

    let router = create_router(state).merge(metrics.router());
    Ok(router.into())
}
