// src/assemble.rs
//! Result assembly: packages an already-computed score and detected facts
//! into the response payload with its three diagnostic flags. This module
//! never recomputes a signal; it only reads values produced upstream.

use serde::Serialize;

use crate::fetch::FailureKind;

/// Score below which a posting is flagged as stale.
pub const STALE_SCORE_THRESHOLD: i32 = 40;
/// Word count below which a description is flagged as weak.
pub const WEAK_WORD_COUNT_THRESHOLD: usize = 400;
/// Fixed low-confidence score when the page could not be fetched.
pub const DEGRADED_SCORE: i32 = 30;

/// Client-side reveal pacing per flag, in milliseconds. UI-only; the engine
/// makes no timing promise here.
#[derive(Debug, Clone, Copy)]
pub struct RevealDelays {
    pub stale: u64,
    pub weak: u64,
    pub inactivity: u64,
}

pub const URL_PATH_DELAYS: RevealDelays = RevealDelays {
    stale: 1000,
    weak: 2200,
    inactivity: 3400,
};

pub const TEXT_PATH_DELAYS: RevealDelays = RevealDelays {
    stale: 900,
    weak: 2000,
    inactivity: 3200,
};

#[derive(Debug, Clone, Serialize)]
pub struct SignalFlag {
    pub result: bool,
    pub delay: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFacts {
    pub posting_age: Option<String>,
    pub employer_source: Option<String>,
    pub canonical_job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Signals {
    pub stale: SignalFlag,
    pub weak: SignalFlag,
    pub inactivity: SignalFlag,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub score: i32,
    pub detected: DetectedFacts,
    pub signals: Signals,
}

/// Assemble the response from computed values.
pub fn assemble(
    score: i32,
    detected: DetectedFacts,
    word_count: usize,
    status: Option<u16>,
    delays: RevealDelays,
) -> AnalysisResult {
    let stale_info = detected
        .posting_age
        .clone()
        .unwrap_or_else(|| "No posting date detected".to_string());

    AnalysisResult {
        score,
        signals: Signals {
            stale: SignalFlag {
                result: score < STALE_SCORE_THRESHOLD,
                delay: delays.stale,
                info: Some(stale_info),
            },
            weak: SignalFlag {
                result: word_count < WEAK_WORD_COUNT_THRESHOLD,
                delay: delays.weak,
                info: None,
            },
            inactivity: SignalFlag {
                result: status != Some(200),
                delay: delays.inactivity,
                info: None,
            },
        },
        detected,
    }
}

/// Description-only path: nothing was fetched, so the inactivity flag has no
/// evidence to report and stays false.
pub fn assemble_text(score: i32, detected: DetectedFacts, word_count: usize) -> AnalysisResult {
    let stale_info = detected
        .posting_age
        .clone()
        .unwrap_or_else(|| "No posting date detected".to_string());

    AnalysisResult {
        score,
        signals: Signals {
            stale: SignalFlag {
                result: score < STALE_SCORE_THRESHOLD,
                delay: TEXT_PATH_DELAYS.stale,
                info: Some(stale_info),
            },
            weak: SignalFlag {
                result: word_count < WEAK_WORD_COUNT_THRESHOLD,
                delay: TEXT_PATH_DELAYS.weak,
                info: None,
            },
            inactivity: SignalFlag {
                result: false,
                delay: TEXT_PATH_DELAYS.inactivity,
                info: None,
            },
        },
        detected,
    }
}

/// Degraded-but-successful result for a non-DNS fetch failure: the failure is
/// itself weak evidence of a problematic posting, so we still answer, at a
/// fixed low score, with the network issue explained in the stale flag.
pub fn degraded(failure: FailureKind, detected: DetectedFacts) -> AnalysisResult {
    let info = match failure {
        FailureKind::Timeout => "The job page took too long to respond.",
        FailureKind::Blocked => "The job site blocked automated access to this page.",
        FailureKind::Other | FailureKind::None => "The job page could not be fetched.",
    };

    AnalysisResult {
        score: DEGRADED_SCORE,
        detected: DetectedFacts {
            posting_age: None,
            ..detected
        },
        signals: Signals {
            stale: SignalFlag {
                result: DEGRADED_SCORE < STALE_SCORE_THRESHOLD,
                delay: URL_PATH_DELAYS.stale,
                info: Some(info.to_string()),
            },
            weak: SignalFlag {
                result: true,
                delay: URL_PATH_DELAYS.weak,
                info: None,
            },
            inactivity: SignalFlag {
                result: false,
                delay: URL_PATH_DELAYS.inactivity,
                info: None,
            },
        },
    }
}
