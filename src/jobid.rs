// src/jobid.rs
//! Canonical job identifier extraction. Works on the parsed URL only — never
//! inspects page content — so near-duplicate URLs for the same posting
//! decorrelate to the same id.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Query parameters that job boards use to carry the posting id
/// (compared case-insensitively).
const JOB_ID_PARAMS: &[&str] = &[
    "jk",
    "vjk",
    "jobid",
    "job_id",
    "gh_jid",
    "currentjobid",
    "posting_id",
    "id",
];

static RE_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{8,}$").expect("slug regex"));
static RE_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5,}").expect("digit-run regex"));

/// Derive a stable job id from the URL.
///
/// Priority: known query parameters, then the last path segment when it looks
/// like an opaque slug, then the first long digit run anywhere in the path.
pub fn canonical_job_id(url: &Url) -> Option<String> {
    for (key, value) in url.query_pairs() {
        let v = value.trim();
        if !v.is_empty()
            && JOB_ID_PARAMS
                .iter()
                .any(|p| key.eq_ignore_ascii_case(p))
        {
            return Some(v.to_string());
        }
    }

    if let Some(segments) = url.path_segments() {
        if let Some(last) = segments.filter(|s| !s.is_empty()).next_back() {
            if RE_SLUG.is_match(last) {
                return Some(last.to_string());
            }
        }
    }

    path_digit_run(url)
}

/// First run of 5+ digits in the URL path, if any. Also feeds the entropy
/// seed in the score composer.
pub fn path_digit_run(url: &Url) -> Option<String> {
    RE_DIGIT_RUN
        .find(url.path())
        .map(|m| m.as_str().to_string())
}
