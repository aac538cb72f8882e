// tests/engine_pipeline.rs
//
// End-to-end engine properties on fixture pages, driven through the library
// (no router, no network): detection tiering, board profiles, score
// composition, and assembly.

use chrono::{Duration, Utc};
use url::Url;

use ghost_job_checker::age;
use ghost_job_checker::assemble::{self, DetectedFacts, URL_PATH_DELAYS};
use ghost_job_checker::board::{self, BoardKind};
use ghost_job_checker::jobid;
use ghost_job_checker::score::{self, PageSignals, ScoreConfig};
use ghost_job_checker::textnorm;

fn filler(words: usize) -> String {
    let mut s = String::new();
    for i in 0..words {
        s.push_str("responsibility");
        s.push_str(&i.to_string());
        s.push(' ');
    }
    s
}

fn greenhouse_page(posted_days_ago: i64, body_words: usize) -> String {
    let date = (Utc::now() - Duration::days(posted_days_ago)).format("%Y-%m-%d");
    format!(
        r##"<html><head>
        <script type="application/ld+json">
        {{"@context":"https://schema.org","@type":"JobPosting","datePosted":"{date}","title":"Platform Engineer"}}
        </script>
        </head><body class="job-post">
        <h1>Platform Engineer</h1>
        <p>Posted 99 days ago</p>
        <div id="application-form">{body}</div>
        <a href="#app">Apply for this job</a>
        </body></html>"##,
        body = filler(body_words),
    )
}

/// Run the URL-path pipeline the way the handler does, against cached HTML.
fn analyze_cached(url: &str, html: &str, status: u16) -> (i32, DetectedFacts, usize) {
    let cfg = ScoreConfig::builtin();
    let url = Url::parse(url).expect("fixture url");
    let host = url.host_str().unwrap().to_string();

    let norm = textnorm::normalize(html);
    let lower_html = html.to_lowercase();
    let facts = DetectedFacts {
        posting_age: age::detect_posting_age(html, &norm.lower, Utc::now()),
        employer_source: Some(host.clone()),
        canonical_job_id: jobid::canonical_job_id(&url),
    };
    let signals = PageSignals {
        status: Some(status),
        text: &norm,
        lower_html: &lower_html,
        profile: board::classify(&host),
        url: &url,
        canonical_id: facts.canonical_job_id.as_deref(),
    };
    let s = score::score_url_page(&cfg, &signals);
    (s, facts, norm.word_count)
}

#[test]
fn structured_date_beats_inline_phrase_in_full_pipeline() {
    let html = greenhouse_page(10, 500);
    let (_, facts, _) = analyze_cached(
        "https://boards.greenhouse.io/acme/jobs/4012345678",
        &html,
        200,
    );
    // The page also says "Posted 99 days ago" inline; tier 1 must win.
    assert_eq!(facts.posting_age.as_deref(), Some("Posted 10 days ago"));
}

#[test]
fn healthy_known_board_page_scores_well_above_shell() {
    let healthy = greenhouse_page(3, 600);
    let (good, ..) = analyze_cached(
        "https://boards.greenhouse.io/acme/jobs/4012345678",
        &healthy,
        200,
    );

    let shell = "<html><body>Please enable JavaScript to continue.</body></html>";
    let (bad, facts, _) = analyze_cached(
        "https://boards.greenhouse.io/acme/jobs/4012345678",
        shell,
        200,
    );
    assert!(good > bad, "healthy {good} should beat shell {bad}");
    assert_eq!(facts.posting_age, None);
}

#[test]
fn evergreen_language_drags_a_known_board_page_down() {
    let clean = greenhouse_page(3, 500);
    let evergreen = clean.replace(
        "Apply for this job",
        "Apply for this job. We are always looking for talent; join our talent community for future opportunities.",
    );
    let url = "https://boards.greenhouse.io/acme/jobs/4012345678";
    let (clean_score, ..) = analyze_cached(url, &clean, 200);
    let (evergreen_score, ..) = analyze_cached(url, &evergreen, 200);
    assert!(
        evergreen_score < clean_score,
        "evergreen {evergreen_score} should be below clean {clean_score}"
    );
}

#[test]
fn aggregator_shell_respects_its_floor_and_ceiling() {
    let cfg = ScoreConfig::builtin();
    let html = r#"<html><body>
        <div class="jobsearch-embed">Warehouse associate needed.</div>
        <a rel="nofollow" href="https://out.example">Apply on company site</a>
        </body></html>"#;
    let (s, facts, _) =
        analyze_cached("https://www.indeed.com/viewjob?jk=ab12cd34ef56", html, 200);
    assert!(s >= cfg.weights.aggregator_floor, "score {s} under floor");
    assert!(s <= cfg.weights.max_score);
    assert_eq!(facts.canonical_job_id.as_deref(), Some("ab12cd34ef56"));
    assert_eq!(
        board::classify("www.indeed.com").kind,
        BoardKind::Indeed
    );
}

#[test]
fn score_is_bit_for_bit_deterministic_across_runs() {
    let html = greenhouse_page(5, 700);
    let url = "https://boards.greenhouse.io/acme/jobs/4012345678";
    let (a, ..) = analyze_cached(url, &html, 200);
    for _ in 0..5 {
        let (b, ..) = analyze_cached(url, &html, 200);
        assert_eq!(a, b);
    }
}

#[test]
fn assembled_result_reflects_engine_outputs() {
    let html = greenhouse_page(2, 600);
    let url = "https://boards.greenhouse.io/acme/jobs/4012345678";
    let (s, facts, wc) = analyze_cached(url, &html, 200);

    let result = assemble::assemble(s, facts, wc, Some(200), URL_PATH_DELAYS);
    assert_eq!(result.score, s);
    assert_eq!(
        result.signals.stale.info.as_deref(),
        Some("Posted 2 days ago")
    );
    assert!(!result.signals.inactivity.result);
    assert!(!result.signals.weak.result, "600-word page is not weak");
    assert!((5..=95).contains(&result.score));
}

#[test]
fn non_200_page_scores_below_its_200_twin() {
    let html = greenhouse_page(5, 600);
    let url = "https://boards.greenhouse.io/acme/jobs/4012345678";
    let (ok, ..) = analyze_cached(url, &html, 200);
    let (gone, ..) = analyze_cached(url, &html, 404);
    assert!(gone < ok);
}
