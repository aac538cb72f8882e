// src/age.rs
//! Posting-age detection. Three tiers, each tried only when the previous one
//! yields nothing:
//!
//! 1. Structured data: `<script type="application/ld+json">` blocks, searched
//!    recursively for `datePosted`/`dateCreated` (JobPosting-typed objects
//!    preferred). Malformed blocks are skipped, never fatal.
//! 2. Meta/time markup: `<time datetime>` elements with "posted" nearby,
//!    `<meta>` tags with publish-date vocabulary, loose `datePosted: "..."`
//!    key-value text.
//! 3. Inline phrases on the lowercase plain text ("just posted",
//!    "posted 3 days ago", bare "3 days ago").
//!
//! Parsed dates render as a relative string ("Posted today", "Posted N days
//! ago"). A date more than 6 hours in the future is treated as unreliable
//! metadata: that tier yields nothing and the next one runs.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_LDJSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("ld+json regex")
});
static RE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<time[^>]*\bdatetime\s*=\s*["']([^"']+)["'][^>]*>"#).expect("time regex")
});
static RE_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("meta regex"));
static RE_META_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:name|property|itemprop)\s*=\s*["']([^"']+)["']"#).expect("meta key regex")
});
static RE_META_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)content\s*=\s*["']([^"']+)["']"#).expect("meta content regex")
});
static RE_LOOSE_KV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)["']?(?:dateposted|date_posted|posteddate|posted_date)["']?\s*[:=]\s*["']([^"']{4,40})["']"#)
        .expect("loose kv regex")
});

// Inline-text tier, in priority order. The "board" variant tolerates
// punctuation between "posted" and the number ("posted: 30+ days ago").
static RE_INLINE_BOARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"posted[\s:•·|-]{0,4}(\d{1,3})\+?\s*(day|hour)s?\s+ago").expect("board-ago regex")
});
static RE_INLINE_GENERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"posted\s+(\d{1,3})\s*(day|hour)s?\s+ago").expect("generic-ago regex")
});
static RE_INLINE_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3})\+?\s*(day|hour)s?\s+ago\b").expect("bare-ago regex")
});

/// Meta keys that carry a publish date on real pages.
const META_DATE_KEYS: &[&str] = &[
    "article:published_time",
    "article:modified_time",
    "og:updated_time",
    "date",
    "dc.date",
    "dc.date.issued",
    "dc.date.created",
    "dateposted",
    "datepublished",
];

/// How far into the future a parsed date may sit before it is discarded
/// as unreliable metadata.
const FUTURE_TOLERANCE_HOURS: i64 = 6;

/// Run the full three-tier fallback. `lower_text` is the lowercase plain-text
/// copy of the page (or pasted description).
pub fn detect_posting_age(html: &str, lower_text: &str, now: DateTime<Utc>) -> Option<String> {
    structured_data_age(html, now)
        .or_else(|| meta_markup_age(html, now))
        .or_else(|| inline_text_age(lower_text))
}

/* ----------------------------
Tier 1: structured data
---------------------------- */

fn structured_data_age(html: &str, now: DateTime<Utc>) -> Option<String> {
    let mut first_any: Option<DateTime<Utc>> = None;

    for caps in RE_LDJSON.captures_iter(html) {
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        // Malformed blocks are common in the wild; skip them silently.
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            continue;
        };

        let mut hits = Vec::new();
        collect_date_fields(&value, false, &mut hits);

        for (date_str, in_job_posting) in hits {
            let Some(parsed) = parse_date(&date_str) else {
                continue;
            };
            if in_job_posting {
                // JobPosting-typed hit wins outright.
                return format_relative(parsed, now);
            }
            if first_any.is_none() {
                first_any = Some(parsed);
            }
        }
    }

    first_any.and_then(|d| format_relative(d, now))
}

/// Recursively gather `datePosted`/`dateCreated` values, tracking whether the
/// enclosing object's `@type` marks a job posting.
fn collect_date_fields(value: &Value, in_job_posting: bool, out: &mut Vec<(String, bool)>) {
    match value {
        Value::Object(map) => {
            let is_job = in_job_posting || type_is_job_posting(map.get("@type"));
            for key in ["datePosted", "dateCreated"] {
                if let Some(Value::String(s)) = map.get(key) {
                    out.push((s.clone(), is_job));
                }
            }
            for v in map.values() {
                collect_date_fields(v, is_job, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_date_fields(v, in_job_posting, out);
            }
        }
        _ => {}
    }
}

fn type_is_job_posting(t: Option<&Value>) -> bool {
    match t {
        Some(Value::String(s)) => s.to_ascii_lowercase().contains("jobposting"),
        Some(Value::Array(items)) => items.iter().any(|v| {
            v.as_str()
                .is_some_and(|s| s.to_ascii_lowercase().contains("jobposting"))
        }),
        _ => false,
    }
}

/* ----------------------------
Tier 2: meta / time markup
---------------------------- */

fn meta_markup_age(html: &str, now: DateTime<Utc>) -> Option<String> {
    // <time datetime="..."> with "posted" in the surrounding 250 chars.
    for caps in RE_TIME.captures_iter(html) {
        let whole = caps.get(0).expect("match 0");
        let datetime = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

        let start = whole.start().saturating_sub(250);
        let end = (whole.end() + 250).min(html.len());
        let window = window_slice(html, start, end);
        if !window.to_lowercase().contains("posted") {
            continue;
        }
        if let Some(parsed) = parse_date(datetime) {
            if let Some(rendered) = format_relative(parsed, now) {
                return Some(rendered);
            }
        }
    }

    // <meta name|property|itemprop="<date vocab>" content="...">.
    for tag in RE_META.find_iter(html) {
        let tag_text = tag.as_str();
        let Some(key) = RE_META_KEY
            .captures(tag_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
        else {
            continue;
        };

        let vocab_hit = META_DATE_KEYS.contains(&key.as_str())
            || (key.contains("date")
                && (key.contains("publish") || key.contains("posted") || key.contains("modified")));
        if !vocab_hit {
            continue;
        }

        let Some(content) = RE_META_CONTENT
            .captures(tag_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };
        if let Some(parsed) = parse_date(content) {
            if let Some(rendered) = format_relative(parsed, now) {
                return Some(rendered);
            }
        }
    }

    // Loose `datePosted: "2024-05-01"`-style key-value text.
    for caps in RE_LOOSE_KV.captures_iter(html) {
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if let Some(parsed) = parse_date(raw) {
            if let Some(rendered) = format_relative(parsed, now) {
                return Some(rendered);
            }
        }
    }

    None
}

/// Slice `html` on char boundaries near the requested byte range.
fn window_slice(html: &str, mut start: usize, mut end: usize) -> &str {
    while start > 0 && !html.is_char_boundary(start) {
        start -= 1;
    }
    while end < html.len() && !html.is_char_boundary(end) {
        end += 1;
    }
    &html[start..end]
}

/* ----------------------------
Tier 3: inline text
---------------------------- */

fn inline_text_age(lower_text: &str) -> Option<String> {
    if lower_text.contains("just posted") || lower_text.contains("posted today") {
        return Some("Posted today".to_string());
    }

    for re in [&*RE_INLINE_BOARD, &*RE_INLINE_GENERIC, &*RE_INLINE_BARE] {
        if let Some(caps) = re.captures(lower_text) {
            let n: i64 = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("day");
            return Some(render_ago(n, unit == "hour"));
        }
    }

    None
}

/* ----------------------------
Date parsing & rendering
---------------------------- */

/// Best-effort date parsing: RFC 3339, bare date, naive datetime, RFC 2822.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d
            .and_hms_opt(0, 0, 0)
            .map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// Render a parsed date relative to `now`, or `None` when the date sits too
/// far in the future to be trusted.
pub fn format_relative(posted: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    if posted > now + Duration::hours(FUTURE_TOLERANCE_HOURS) {
        return None;
    }

    let delta = now.signed_duration_since(posted);
    let days = delta.num_days();
    if days <= 0 {
        let hours = delta.num_hours();
        if hours <= 0 {
            return Some("Posted today".to_string());
        }
        return Some(render_ago(hours, true));
    }
    Some(render_ago(days, false))
}

fn render_ago(n: i64, hours: bool) -> String {
    let unit = if hours { "hour" } else { "day" };
    if n == 1 {
        format!("Posted 1 {unit} ago")
    } else {
        format!("Posted {n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textnorm;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn detect(html: &str) -> Option<String> {
        let n = textnorm::normalize(html);
        detect_posting_age(html, &n.lower, now())
    }

    #[test]
    fn structured_data_wins_over_inline_phrase() {
        let date = now() - Duration::days(10);
        let html = format!(
            r#"<html><script type="application/ld+json">
               {{"@type":"JobPosting","datePosted":"{}"}}
               </script><body>Posted 3 days ago</body></html>"#,
            date.format("%Y-%m-%d")
        );
        let got = detect(&html).expect("age");
        assert!(got.starts_with("Posted"), "got {got}");
        assert_ne!(got, "Posted 3 days ago");
    }

    #[test]
    fn job_posting_typed_block_preferred_over_first_hit() {
        let article = now() - Duration::days(90);
        let job = now() - Duration::days(2);
        let html = format!(
            r#"<script type="application/ld+json">{{"@type":"Article","dateCreated":"{a}"}}</script>
               <script type="application/ld+json">{{"@type":"JobPosting","datePosted":"{j}"}}</script>"#,
            a = article.format("%Y-%m-%d"),
            j = job.format("%Y-%m-%d"),
        );
        assert_eq!(detect(&html).as_deref(), Some("Posted 2 days ago"));
    }

    #[test]
    fn malformed_block_is_skipped_not_fatal() {
        let html = r#"<script type="application/ld+json">{not json</script>
                      <body>posted 5 days ago</body>"#;
        assert_eq!(detect(html).as_deref(), Some("Posted 5 days ago"));
    }

    #[test]
    fn nested_graph_objects_are_searched() {
        let date = now() - Duration::days(4);
        let html = format!(
            r#"<script type="application/ld+json">
               {{"@graph":[{{"@type":"WebPage"}},{{"@type":"JobPosting","datePosted":"{}"}}]}}
               </script>"#,
            date.format("%Y-%m-%d")
        );
        assert_eq!(detect(&html).as_deref(), Some("Posted 4 days ago"));
    }

    #[test]
    fn future_dated_structured_block_cascades_to_next_tier() {
        let future = now() + Duration::days(30);
        let html = format!(
            r#"<script type="application/ld+json">{{"@type":"JobPosting","datePosted":"{}"}}</script>
               <body>posted 7 days ago</body>"#,
            future.format("%Y-%m-%d")
        );
        assert_eq!(detect(&html).as_deref(), Some("Posted 7 days ago"));
    }

    #[test]
    fn time_element_requires_posted_nearby() {
        let date = (now() - Duration::days(3)).format("%Y-%m-%d").to_string();
        let with_context = format!(r#"<span>Posted on <time datetime="{date}">then</time></span>"#);
        assert_eq!(detect(&with_context).as_deref(), Some("Posted 3 days ago"));

        let without_context = format!(r#"<time datetime="{date}">then</time>"#);
        assert_eq!(detect(&without_context), None);
    }

    #[test]
    fn meta_published_time_is_used() {
        let date = now() - Duration::days(12);
        let html = format!(
            r#"<meta property="article:published_time" content="{}" />"#,
            date.to_rfc3339()
        );
        assert_eq!(detect(&html).as_deref(), Some("Posted 12 days ago"));
    }

    #[test]
    fn loose_key_value_fallback() {
        let date = (now() - Duration::days(6)).format("%Y-%m-%d").to_string();
        let html = format!(r#"<div>var x = {{"datePosted":"{date}"}};</div>"#);
        assert_eq!(detect(&html).as_deref(), Some("Posted 6 days ago"));
    }

    #[test]
    fn inline_just_posted_means_today() {
        assert_eq!(detect("<p>Just posted</p>").as_deref(), Some("Posted today"));
        assert_eq!(
            detect("<p>Posted today · Full-time</p>").as_deref(),
            Some("Posted today")
        );
    }

    #[test]
    fn inline_board_style_with_punctuation() {
        assert_eq!(
            detect("<p>Posted: 30+ days ago</p>").as_deref(),
            Some("Posted 30 days ago")
        );
    }

    #[test]
    fn inline_bare_ago_is_last_resort() {
        assert_eq!(detect("<p>3 days ago</p>").as_deref(), Some("Posted 3 days ago"));
        assert_eq!(detect("<p>1 hour ago</p>").as_deref(), Some("Posted 1 hour ago"));
    }

    #[test]
    fn no_signal_yields_none() {
        assert_eq!(detect("<p>Great role, apply within.</p>"), None);
    }

    #[test]
    fn relative_rendering_buckets() {
        let n = now();
        assert_eq!(format_relative(n, n).as_deref(), Some("Posted today"));
        assert_eq!(
            format_relative(n - Duration::hours(1), n).as_deref(),
            Some("Posted 1 hour ago")
        );
        assert_eq!(
            format_relative(n - Duration::hours(5), n).as_deref(),
            Some("Posted 5 hours ago")
        );
        assert_eq!(
            format_relative(n - Duration::days(1), n).as_deref(),
            Some("Posted 1 day ago")
        );
        assert_eq!(
            format_relative(n - Duration::days(14), n).as_deref(),
            Some("Posted 14 days ago")
        );
        // Slightly-future timestamps (clock skew) still count as today.
        assert_eq!(
            format_relative(n + Duration::hours(2), n).as_deref(),
            Some("Posted today")
        );
        assert_eq!(format_relative(n + Duration::hours(7), n), None);
    }
}
