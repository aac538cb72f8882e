// src/score.rs
//! Signal composer: an additive sum of many independently-failing weak
//! signals, plus deterministic pseudo-variation to de-cluster near-identical
//! inputs, clamped to the output range. All weights and phrase lists live in
//! named tables (`ScoreConfig`) loaded from `config/scoring.toml`.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use url::Url;

use crate::board::{self, BoardProfile};
use crate::jobid;
use crate::textnorm::NormalizedText;

pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";
pub const ENV_SCORING_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";

/// Compiled-in defaults; the shipped file and the fallback are the same data.
const BUILTIN_SCORING_TOML: &str = include_str!("../config/scoring.toml");

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreConfig {
    pub weights: WeightTable,
    pub word_count: WordCountTable,
    pub phrases: PhraseTable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightTable {
    pub base: i32,
    pub status_ok_bonus: i32,
    pub status_bad_penalty: i32,
    pub evergreen_penalty: i32,
    pub cta_bonus: i32,
    pub cta_missing_penalty: i32,
    pub board_trust_bonus: i32,
    pub aggregator_trust_bonus: i32,
    pub entropy_modulo: u32,
    pub aggregator_entropy_modulo: u32,
    pub aggregator_floor: i32,
    pub min_score: i32,
    pub max_score: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordCountTable {
    pub thin_below: usize,
    pub solid_below: usize,
    pub bloat_from: usize,
    pub thin_penalty: i32,
    pub solid_bonus: i32,
    pub rich_bonus: i32,
    pub bloat_penalty: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhraseTable {
    pub evergreen: Vec<String>,
    pub call_to_action: Vec<String>,
    pub urgency: Vec<String>,
    pub outbound_apply: Vec<String>,
}

impl ScoreConfig {
    /// Load from `SCORING_CONFIG_PATH` or the default path; a missing file
    /// falls back to the compiled-in defaults, a present-but-broken file is
    /// an error.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| {
                anyhow::anyhow!("invalid scoring config at {}: {}", path.display(), e)
            }),
            Err(_) => Ok(Self::builtin()),
        }
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: ScoreConfig = toml::from_str(toml_str)?;
        Ok(cfg)
    }

    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_SCORING_TOML).expect("builtin scoring config parses")
    }
}

fn resolve_config_path() -> PathBuf {
    std::env::var(ENV_SCORING_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCORING_CONFIG_PATH))
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// Shared handle so the config can be hot-reloaded in dev without restarting.
#[derive(Clone)]
pub struct ScoringHandle {
    inner: Arc<RwLock<ScoreConfig>>,
}

impl ScoringHandle {
    pub fn new(cfg: ScoreConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cfg)),
        }
    }

    pub fn current(&self) -> ScoreConfig {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => ScoreConfig::builtin(),
        }
    }
}

fn hot_reload_enabled() -> bool {
    let want = std::env::var("SCORING_HOT_RELOAD")
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
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

/// Poll `path` for mtime changes every 2s and swap the config atomically.
/// Dev-gated; no-op unless SCORING_HOT_RELOAD=1.
pub fn start_hot_reload_thread(handle: ScoringHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => {
                        last_mtime = Some(mtime);
                        false
                    }
                    Some(prev) => mtime > prev,
                };
                if changed {
                    if let Ok(content) = fs::read_to_string(&path) {
                        if let Ok(fresh) = ScoreConfig::from_toml_str(&content) {
                            if let Ok(mut guard) = handle.inner.write() {
                                *guard = fresh;
                            }
                        }
                    }
                    last_mtime = Some(mtime);
                }
            }
            thread::sleep(poll);
        }
    });
}

/* ----------------------------
Deterministic hashing (v1)
---------------------------- */

/// Versioned fold hash: order-sensitive character accumulation with a fixed
/// multiplier, folded to non-negative. Deliberately NOT the language-default
/// hasher, whose output may vary across runtimes.
pub fn fold_hash_v1(input: &str) -> u32 {
    let mut h: i32 = 0;
    for c in input.chars() {
        h = h.wrapping_mul(31).wrapping_add(c as i32);
    }
    h.unsigned_abs()
}

/// Entropy term: hash of a per-request seed reduced to a fixed range.
/// Prefers the canonical job id; appends any long digit run from the path so
/// near-identical URLs with different numeric ids spread apart.
fn entropy_term(modulo: u32, canonical_id: Option<&str>, url: &Url) -> i32 {
    let mut seed = match canonical_id {
        Some(id) => id.to_string(),
        None => url.as_str().to_string(),
    };
    if let Some(run) = jobid::path_digit_run(url) {
        seed.push_str(&run);
    }
    (fold_hash_v1(&seed) % modulo.max(1)) as i32
}

/// De-clustering term in [-3, +3] from hostname, word count and URL length.
fn variation_term(host: &str, word_count: usize, url_len: usize) -> i32 {
    let seed = format!("{host}{word_count}{url_len}");
    (fold_hash_v1(&seed) % 7) as i32 - 3
}

/* ----------------------------
Composition
---------------------------- */

/// Everything the composer needs for a fetched page, precomputed upstream.
pub struct PageSignals<'a> {
    pub status: Option<u16>,
    pub text: &'a NormalizedText,
    pub lower_html: &'a str,
    pub profile: &'static BoardProfile,
    pub url: &'a Url,
    pub canonical_id: Option<&'a str>,
}

/// Compose the trust score for a fetched page. Deterministic: identical
/// inputs always produce the identical score.
pub fn score_url_page(cfg: &ScoreConfig, sig: &PageSignals<'_>) -> i32 {
    let w = &cfg.weights;
    let aggregator = sig.profile.aggregator;
    let mut score = w.base;

    score += if sig.status == Some(200) {
        w.status_ok_bonus
    } else {
        -w.status_bad_penalty
    };

    score += word_count_term(cfg, sig.text.word_count, aggregator);

    score += board::description_signal(
        sig.profile,
        sig.lower_html,
        sig.text.word_count,
        &cfg.phrases.outbound_apply,
    );

    // Board-specific secondary heuristics.
    if sig.profile.urgency_bonus != 0
        && cfg
            .phrases
            .urgency
            .iter()
            .any(|p| sig.text.lower.contains(p.as_str()))
    {
        score += sig.profile.urgency_bonus;
    }
    score += sig.profile.uncertainty_penalty;

    if !aggregator {
        score += evergreen_term(cfg, &sig.text.lower);
        score += cta_term(cfg, &sig.text.lower);
    }

    score += if aggregator {
        w.aggregator_trust_bonus
    } else if sig.profile.trust_bonus > 0 {
        w.board_trust_bonus
    } else {
        0
    };

    let modulo = if aggregator {
        w.aggregator_entropy_modulo
    } else {
        w.entropy_modulo
    };
    score += entropy_term(modulo, sig.canonical_id, sig.url);
    score += variation_term(
        sig.url.host_str().unwrap_or_default(),
        sig.text.word_count,
        sig.url.as_str().len(),
    );

    if aggregator {
        score = score.max(w.aggregator_floor);
    }
    score.clamp(w.min_score, w.max_score)
}

/// Compose the trust score for pasted description text (no URL, no status,
/// no board profile): the textual subset of the signal set. The URL-seeded
/// entropy term has no seed here, so only the variation term de-clusters.
pub fn score_description(cfg: &ScoreConfig, text: &NormalizedText) -> i32 {
    let w = &cfg.weights;
    let mut score = w.base;

    score += word_count_term(cfg, text.word_count, false);
    score += evergreen_term(cfg, &text.lower);
    score += cta_term(cfg, &text.lower);

    score += variation_term("", text.word_count, text.plain.len());

    score.clamp(w.min_score, w.max_score)
}

fn word_count_term(cfg: &ScoreConfig, word_count: usize, aggregator: bool) -> i32 {
    let t = &cfg.word_count;
    if word_count < t.thin_below {
        // Aggregator shells are thin by design; the penalty is waived.
        if aggregator {
            0
        } else {
            -t.thin_penalty
        }
    } else if word_count < t.solid_below {
        t.solid_bonus
    } else if word_count < t.bloat_from {
        t.rich_bonus
    } else {
        -t.bloat_penalty
    }
}

/// Cumulative penalty per evergreen phrase found.
fn evergreen_term(cfg: &ScoreConfig, lower: &str) -> i32 {
    let hits = cfg
        .phrases
        .evergreen
        .iter()
        .filter(|p| lower.contains(p.as_str()))
        .count() as i32;
    -hits * cfg.weights.evergreen_penalty
}

fn cta_term(cfg: &ScoreConfig, lower: &str) -> i32 {
    let present = cfg
        .phrases
        .call_to_action
        .iter()
        .any(|p| lower.contains(p.as_str()));
    if present {
        cfg.weights.cta_bonus
    } else {
        -cfg.weights.cta_missing_penalty
    }
}
