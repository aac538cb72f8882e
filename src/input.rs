// src/input.rs
//! Request validation: exactly one of a job link or pasted description must
//! survive trimming, and links must be well-formed http(s) URLs with a host.
//! Failures here never reach the scoring pipeline.

use url::Url;

/// Request-level failures, surfaced to the caller as a 4xx with a
/// field-specific message. DNS is separated from generic fetch failure
/// because it indicates a user input problem, not a page problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    Validation(String),
    Dns(String),
}

impl RequestError {
    pub fn message(&self) -> String {
        match self {
            RequestError::Validation(msg) => msg.clone(),
            RequestError::Dns(host) => format!(
                "Could not reach {host}. Check the link for typos, or paste the job description instead."
            ),
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for RequestError {}

/// Which downstream path runs. Built once per request, immutable after.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Url(Url),
    Description(String),
}

/// Trim both candidate fields and select the analysis path. The URL path
/// wins when both are supplied.
pub fn normalize(url: Option<&str>, description: Option<&str>) -> Result<AnalysisInput, RequestError> {
    let url = url.map(str::trim).filter(|s| !s.is_empty());
    let description = description.map(str::trim).filter(|s| !s.is_empty());

    match (url, description) {
        (Some(raw), _) => parse_link(raw).map(AnalysisInput::Url),
        (None, Some(text)) => Ok(AnalysisInput::Description(text.to_string())),
        (None, None) => Err(RequestError::Validation(
            "Provide a job link or a job description.".to_string(),
        )),
    }
}

fn parse_link(raw: &str) -> Result<Url, RequestError> {
    let parsed = Url::parse(raw).map_err(|_| {
        RequestError::Validation(
            "That doesn't look like a valid link. Paste the full job posting URL, starting with https://."
                .to_string(),
        )
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RequestError::Validation(format!(
                "Unsupported protocol \"{other}\". Only http:// and https:// links can be checked."
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(RequestError::Validation(
            "That doesn't look like a valid link. Paste the full job posting URL, starting with https://."
                .to_string(),
        ));
    }

    Ok(parsed)
}
