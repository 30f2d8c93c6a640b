//! Deterministic classification of OCR detections into an `AnalysisResult`.
//!
//! Every step is first-match-wins over the detections in the order the
//! provider returned them. There is no scoring and no re-ranking: the same
//! detections in the same order always give the same result, and reordering
//! them can change it.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::types::{AnalysisResult, Category, DetectionKind, TextDetection};

/// LINE detections at or below this confidence are ignored.
pub const MIN_LINE_CONFIDENCE: f32 = 60.0;

/// Title used when no line qualifies and no URL was found.
pub const DEFAULT_TITLE: &str = "New Inspiration";

/// Summary used when nothing survives filtering.
pub const EMPTY_SUMMARY: &str = "No description available.";

/// Summaries are cut to this many characters.
pub const MAX_SUMMARY_CHARS: usize = 500;

const SENTENCE_LINES: usize = 5;
const KEYWORD_LINES: usize = 8;

/// UI chrome that is never a title.
const TITLE_STOP_WORDS: [&str; 5] = ["Get Started", "Login", "Sign Up", "Menu", "Context"];

/// UI chrome that never belongs in a summary.
const SUMMARY_STOP_WORDS: [&str; 9] = [
    "Menu",
    "Back",
    "Done",
    "Cancel",
    "Search",
    "Share",
    "Settings",
    "Get Started",
    "Login",
];

/// Scheme-qualified or `www.`-prefixed links.
static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'`]+"#).expect("link pattern is valid")
});

/// Bare domains on common modern TLDs, e.g. `21st.dev`, `linear.app`.
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9-]+\.(?:com|org|net|io|dev|app|ai|co|uk|tech|design|xyz|me|so)\b")
        .expect("domain pattern is valid")
});

/// Status-bar clocks: `9:41`, `12:00 PM`.
static LEADING_CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}").expect("clock pattern is valid"));

/// Stateless classifier; see the module docs for the ordering contract.
pub struct TextClassifier;

impl TextClassifier {
    /// Classify detections into title, summary and URL.
    ///
    /// Never fails. Input with no usable lines yields `DEFAULT_TITLE`,
    /// `EMPTY_SUMMARY` and no URL.
    pub fn classify(detections: &[TextDetection]) -> AnalysisResult {
        let lines = confident_lines(detections);
        tracing::debug!(
            "Classifying {} detections ({} confident lines)",
            detections.len(),
            lines.len()
        );

        let url = extract_url(&lines);
        let title = select_title(&lines, url.as_deref());
        let summary = build_summary(&lines, &title, url.as_deref());

        tracing::trace!(?url, %title, "Classified detections");

        AnalysisResult {
            title,
            summary,
            category: Category::Website,
            tags: Vec::new(),
            url,
        }
    }
}

/// LINE detections above the confidence floor, in detection order.
fn confident_lines(detections: &[TextDetection]) -> Vec<&str> {
    detections
        .iter()
        .filter(|d| d.kind == DetectionKind::Line && d.effective_confidence() > MIN_LINE_CONFIDENCE)
        .map(|d| d.text.as_str())
        .collect()
}

/// First absolute link, else first bare domain (given an `https://` prefix).
pub fn extract_url(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| find_link(line))
        .or_else(|| lines.iter().find_map(|line| find_domain(line)))
}

fn find_link(line: &str) -> Option<String> {
    LINK_PATTERN.find_iter(line).find_map(|m| {
        let candidate = m
            .as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '}'));
        let absolute = if starts_with_ignore_case(candidate, "www.") {
            format!("http://{candidate}")
        } else {
            candidate.to_string()
        };
        let parsed = Url::parse(&absolute).ok()?;
        parsed.host_str().filter(|h| !h.is_empty())?;
        Some(absolute)
    })
}

fn find_domain(line: &str) -> Option<String> {
    let candidate = DOMAIN_PATTERN.find(line)?.as_str();
    if candidate.chars().any(char::is_whitespace) {
        return None;
    }
    tracing::debug!("Heuristic URL match: {candidate}");
    Some(format!("https://{candidate}"))
}

/// The URL with its scheme removed, up to the first path/query/fragment
/// delimiter. Case is preserved.
fn authority(url: &str) -> &str {
    let rest = ["https://", "http://"]
        .iter()
        .find(|scheme| starts_with_ignore_case(url, scheme))
        .map(|scheme| &url[scheme.len()..])
        .unwrap_or(url);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// First line that is not the URL, a clock, UI chrome or too short.
pub fn select_title(lines: &[&str], url: Option<&str>) -> String {
    let host = url.map(authority).filter(|h| !h.is_empty());

    let candidate = lines.iter().copied().find(|&line| {
        if host.is_some_and(|h| line.contains(h)) {
            return false;
        }
        let len = line.chars().count();
        if line.contains(':') && len < 6 {
            return false;
        }
        if TITLE_STOP_WORDS.contains(&line) {
            return false;
        }
        len > 3
    });

    match (candidate, host) {
        (Some(line), _) => line.to_string(),
        (None, Some(host)) => host.to_string(),
        (None, None) => DEFAULT_TITLE.to_string(),
    }
}

/// Up to five sentence-like lines joined by spaces, else up to eight
/// remaining lines joined by commas.
pub fn build_summary(lines: &[&str], title: &str, url: Option<&str>) -> String {
    let valid: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|text| {
            if *text == title || Some(*text) == url {
                return false;
            }
            if LEADING_CLOCK.is_match(text) {
                return false;
            }
            if SUMMARY_STOP_WORDS.contains(text) {
                return false;
            }
            if text.chars().count() < 5 {
                return false;
            }
            !(text.starts_with('=') || text.starts_with('+'))
        })
        .collect();

    let sentences: Vec<&str> = valid
        .iter()
        .copied()
        .filter(|text| text.split(' ').count() > 3)
        .take(SENTENCE_LINES)
        .collect();

    let summary = if sentences.is_empty() {
        valid
            .iter()
            .take(KEYWORD_LINES)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        sentences.join(" ")
    };

    let truncated: String = summary.chars().take(MAX_SUMMARY_CHARS).collect();
    if truncated.is_empty() {
        EMPTY_SUMMARY.to_string()
    } else {
        truncated
    }
}
