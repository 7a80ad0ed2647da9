//! Local short-answer heuristics.

/// Keywords shorter than this are ignored.
const MIN_KEYWORD_LEN: usize = 4;
pub const KEYWORD_RATIO_THRESHOLD: f64 = 0.5;
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Lowercase, punctuation to spaces, collapsed whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Share of the expected answer's keywords found in `answer`.
/// Both inputs must already be normalized.
pub fn keyword_overlap(answer: &str, expected: &str) -> f64 {
    let keywords: Vec<&str> = expected
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .collect();
    if keywords.is_empty() {
        return 0.0;
    }

    let found = keywords.iter().filter(|k| answer.contains(*k)).count();
    found as f64 / keywords.len() as f64
}
