use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::assemble::{self, DetectedFacts, URL_PATH_DELAYS};
use crate::board;
use crate::fetch::{FailureKind, HttpPageFetcher, PageFetcher};
use crate::input::{self, AnalysisInput, RequestError};
use crate::jobid;
use crate::score::{self, PageSignals, ScoreConfig, ScoringHandle};
use crate::textnorm;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn PageFetcher>,
    pub scoring: ScoringHandle,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn PageFetcher>, scoring: ScoringHandle) -> Self {
        Self { fetcher, scoring }
    }

    /// State with the real reqwest fetcher and the configured scoring tables.
    pub fn production() -> anyhow::Result<Self> {
        Ok(Self {
            fetcher: Arc::new(HttpPageFetcher::new()?),
            scoring: ScoringHandle::new(ScoreConfig::from_toml()?),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "jobDescription")]
    job_description: Option<String>,
}

async fn analyze(State(state): State<AppState>, Json(body): Json<AnalyzeReq>) -> Response {
    counter!("analyze_requests_total").increment(1);

    let input = match input::normalize(body.url.as_deref(), body.job_description.as_deref()) {
        Ok(input) => input,
        Err(e) => return reject(e),
    };

    match input {
        AnalysisInput::Description(text) => analyze_description(&state, &text),
        AnalysisInput::Url(url) => analyze_url(&state, url).await,
    }
}

fn analyze_description(state: &AppState, text: &str) -> Response {
    dev_log("text", text);

    let cfg = state.scoring.current();
    let norm = textnorm::normalize(text);
    let score = score::score_description(&cfg, &norm);

    let result = assemble::assemble_text(score, DetectedFacts::default(), norm.word_count);
    Json(result).into_response()
}

async fn analyze_url(state: &AppState, url: url::Url) -> Response {
    dev_log("url", url.as_str());

    // DNS-class failures are request problems, surfaced before any fetch.
    if let Err(e) = state.fetcher.resolve(&url).await {
        return reject(e);
    }

    let host = url.host_str().unwrap_or_default().to_string();
    let facts = DetectedFacts {
        posting_age: None,
        employer_source: Some(host.clone()),
        canonical_job_id: jobid::canonical_job_id(&url),
    };

    let outcome = state.fetcher.fetch(&url).await;
    if outcome.failure != FailureKind::None {
        counter!("analyze_degraded_total").increment(1);
        return Json(assemble::degraded(outcome.failure, facts)).into_response();
    }

    let cfg = state.scoring.current();
    let norm = textnorm::normalize(&outcome.body);
    let lower_html = outcome.body.to_lowercase();

    let facts = DetectedFacts {
        posting_age: crate::age::detect_posting_age(&outcome.body, &norm.lower, Utc::now()),
        ..facts
    };

    let profile = board::classify(&host);
    let signals = PageSignals {
        status: outcome.status,
        text: &norm,
        lower_html: &lower_html,
        profile,
        url: &url,
        canonical_id: facts.canonical_job_id.as_deref(),
    };
    let score = score::score_url_page(&cfg, &signals);

    let result = assemble::assemble(score, facts, norm.word_count, outcome.status, URL_PATH_DELAYS);
    Json(result).into_response()
}

fn reject(err: RequestError) -> Response {
    counter!("analyze_validation_rejected_total").increment(1);
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": err.message() })),
    )
        .into_response()
}

/* ----------------------------
Anonymized dev logging
---------------------------- */

// Dev logging gate: GHOSTJOB_DEV_LOG=1 AND dev env (debug build or
// SHUTTLE_ENV in {local, development, dev}).
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("GHOSTJOB_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short stable id for correlating dev log lines without logging raw input.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log(path: &str, raw: &str) {
    if !dev_logging_enabled() {
        return;
    }
    // Never log raw URLs or pasted text; only a hashed id and the path taken.
    tracing::info!(target: "analyze", id = %anon_hash(raw), path, "analyze request");
}
