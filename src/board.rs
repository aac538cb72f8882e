// src/board.rs
//! Board profiles: a closed, ordered table of recognized job-board hostname
//! families. Each profile carries the structural markers expected in that
//! board's description container and its score adjustments, so dispatch is a
//! single table lookup instead of scattered per-site conditionals.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoardKind {
    LinkedIn,
    Indeed,
    Greenhouse,
    Lever,
    Workday,
    ZipRecruiter,
    Glassdoor,
    Unknown,
}

#[derive(Debug)]
pub struct BoardProfile {
    pub kind: BoardKind,
    /// Hostname suffixes that select this profile.
    hosts: &'static [&'static str],
    /// Substrings expected in the board's description container
    /// (matched against the lowercased raw HTML).
    pub markers: &'static [&'static str],
    /// Word-count threshold for the strong (two-marker) signal.
    pub strong_min_words: usize,
    /// Word-count threshold for the moderate (one-marker) signal.
    pub moderate_min_words: usize,
    pub strong_bonus: i32,
    pub moderate_bonus: i32,
    /// Applied when the expected structure is absent (shell/blocked page).
    pub missing_penalty: i32,
    /// Boards that serve near-identical pages to automated fetchers.
    pub uncertainty_penalty: i32,
    /// Boards whose "urgently hiring" phrasing is a hiring-activity signal.
    pub urgency_bonus: i32,
    /// Thin wrapper around an outbound apply link; softened rule set.
    pub aggregator: bool,
    pub trust_bonus: i32,
}

/// Outbound-apply bonus for aggregator shells.
pub const OUTBOUND_APPLY_BONUS: i32 = 6;
/// Aggregator description signal is clamped independently of the global
/// clamp, reflecting bounded confidence in shell pages.
pub const AGGREGATOR_SIGNAL_MIN: i32 = -6;
pub const AGGREGATOR_SIGNAL_MAX: i32 = 16;

static PROFILES: &[BoardProfile] = &[
    BoardProfile {
        kind: BoardKind::LinkedIn,
        hosts: &["linkedin.com"],
        markers: &["about the job", "show more", "jobs-description"],
        strong_min_words: 350,
        moderate_min_words: 150,
        strong_bonus: 14,
        moderate_bonus: 7,
        missing_penalty: -10,
        // LinkedIn serves the same authwall shell to most automated fetches.
        uncertainty_penalty: -6,
        urgency_bonus: 0,
        aggregator: false,
        trust_bonus: 10,
    },
    BoardProfile {
        kind: BoardKind::Indeed,
        hosts: &["indeed.com"],
        markers: &["jobdescriptiontext", "jobsearch", "job details"],
        strong_min_words: 250,
        moderate_min_words: 100,
        strong_bonus: 12,
        moderate_bonus: 6,
        missing_penalty: -4,
        uncertainty_penalty: 0,
        urgency_bonus: 6,
        aggregator: true,
        trust_bonus: 6,
    },
    BoardProfile {
        kind: BoardKind::Greenhouse,
        hosts: &["greenhouse.io"],
        markers: &["apply for this job", "job-post", "application-form"],
        strong_min_words: 300,
        moderate_min_words: 120,
        strong_bonus: 15,
        moderate_bonus: 8,
        missing_penalty: -8,
        uncertainty_penalty: 0,
        urgency_bonus: 0,
        aggregator: false,
        trust_bonus: 10,
    },
    BoardProfile {
        kind: BoardKind::Lever,
        hosts: &["lever.co"],
        markers: &["posting-headline", "posting-categories", "apply for this job"],
        strong_min_words: 300,
        moderate_min_words: 120,
        strong_bonus: 15,
        moderate_bonus: 8,
        missing_penalty: -8,
        uncertainty_penalty: 0,
        urgency_bonus: 0,
        aggregator: false,
        trust_bonus: 10,
    },
    BoardProfile {
        kind: BoardKind::Workday,
        hosts: &["myworkdayjobs.com"],
        markers: &["jobpostingdescription", "automation-id", "job posting"],
        strong_min_words: 300,
        moderate_min_words: 120,
        strong_bonus: 12,
        moderate_bonus: 6,
        // Workday renders client-side; an empty shell here means we got
        // nothing useful, same as a blocked page.
        missing_penalty: -12,
        uncertainty_penalty: 0,
        urgency_bonus: 0,
        aggregator: false,
        trust_bonus: 10,
    },
    BoardProfile {
        kind: BoardKind::ZipRecruiter,
        hosts: &["ziprecruiter.com"],
        markers: &["job_description", "apply now", "job-body"],
        strong_min_words: 250,
        moderate_min_words: 100,
        strong_bonus: 12,
        moderate_bonus: 6,
        missing_penalty: -4,
        uncertainty_penalty: 0,
        urgency_bonus: 6,
        aggregator: true,
        trust_bonus: 6,
    },
    BoardProfile {
        kind: BoardKind::Glassdoor,
        hosts: &["glassdoor.com"],
        markers: &["jobdescriptioncontent", "job overview", "show more"],
        strong_min_words: 300,
        moderate_min_words: 120,
        strong_bonus: 12,
        moderate_bonus: 6,
        missing_penalty: -8,
        uncertainty_penalty: -6,
        urgency_bonus: 0,
        aggregator: false,
        trust_bonus: 10,
    },
];

static UNKNOWN: BoardProfile = BoardProfile {
    kind: BoardKind::Unknown,
    hosts: &[],
    markers: &[],
    strong_min_words: 0,
    moderate_min_words: 0,
    strong_bonus: 0,
    moderate_bonus: 0,
    missing_penalty: 0,
    uncertainty_penalty: 0,
    urgency_bonus: 0,
    aggregator: false,
    trust_bonus: 0,
};

/// Match a hostname against the ordered profile table; unknown hosts fall
/// through to the default profile.
pub fn classify(host: &str) -> &'static BoardProfile {
    let host = host.to_ascii_lowercase();
    for profile in PROFILES {
        for suffix in profile.hosts {
            if host == *suffix || host.ends_with(&format!(".{suffix}")) {
                return profile;
            }
        }
    }
    &UNKNOWN
}

/// Count description-container markers present in the lowercased raw HTML.
pub fn marker_hits(profile: &BoardProfile, lower_html: &str) -> usize {
    profile
        .markers
        .iter()
        .filter(|m| lower_html.contains(**m))
        .count()
}

/// Description-structure contribution for a known board: two markers plus a
/// healthy word count is a strong positive, a single marker a moderate one,
/// and expected-but-absent structure a negative. Aggregator shells get the
/// softened rules: no low-word-count expectation, an outbound-apply-link
/// bonus, and an independent clamp.
pub fn description_signal(
    profile: &BoardProfile,
    lower_html: &str,
    word_count: usize,
    outbound_apply_markers: &[String],
) -> i32 {
    if profile.kind == BoardKind::Unknown {
        return 0;
    }

    let hits = marker_hits(profile, lower_html);
    let mut signal = if hits >= 2 && word_count >= profile.strong_min_words {
        profile.strong_bonus
    } else if hits >= 1 && word_count >= profile.moderate_min_words {
        profile.moderate_bonus
    } else if profile.aggregator && hits >= 1 {
        // Shell pages are thin by design; one marker is still structure.
        profile.moderate_bonus
    } else {
        profile.missing_penalty
    };

    if profile.aggregator {
        if outbound_apply_markers
            .iter()
            .any(|m| lower_html.contains(m.as_str()))
        {
            signal += OUTBOUND_APPLY_BONUS;
        }
        signal = signal.clamp(AGGREGATOR_SIGNAL_MIN, AGGREGATOR_SIGNAL_MAX);
    }

    signal
}
