// src/textnorm.rs
//! Markup stripping and word counting. All marker matching elsewhere runs on
//! the lowercase copy produced here, so the stripping strategy can be swapped
//! without touching scoring.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]*>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Plain-text view of a page (or pasted description) plus derived stats.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub plain: String,
    pub lower: String,
    pub word_count: usize,
}

/// Strip markup to plain text: decode HTML entities, replace every tag
/// boundary with a single space, collapse whitespace, trim.
pub fn normalize(raw: &str) -> NormalizedText {
    let decoded = html_escape::decode_html_entities(raw);
    let stripped = RE_TAGS.replace_all(&decoded, " ");
    let collapsed = RE_WS.replace_all(&stripped, " ");
    let plain = collapsed.trim().to_string();

    let lower = plain.to_lowercase();
    let word_count = plain.split_whitespace().count();

    NormalizedText {
        plain,
        lower,
        word_count,
    }
}
