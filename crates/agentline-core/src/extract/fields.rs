//! Field validation and the partial triple shared by all cascade tiers.

use agentline_types::extraction::{DEFAULT_CONFIDENCE, ExtractedResult, Sentiment};

/// Upper bound on the portion of input the patterns look at.
pub const MAX_SCAN_BYTES: usize = 256 * 1024;

/// Longest response the raw-text cleanup tier will return, in characters.
pub const MAX_CLEANUP_CHARS: usize = 1000;

/// Whatever a single tier managed to recover. Every populated field has
/// already passed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partial {
    pub response: Option<String>,
    pub confidence: Option<f64>,
    pub sentiment: Option<Sentiment>,
}

impl Partial {
    pub fn is_complete(&self) -> bool {
        self.response.is_some() && self.confidence.is_some() && self.sentiment.is_some()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.response.is_none() && self.confidence.is_none() && self.sentiment.is_none()
    }

    /// Fill fields that are still missing from `other`. Fields already set
    /// are never replaced.
    pub fn absorb(&mut self, other: Partial) {
        if self.response.is_none() {
            self.response = other.response;
        }
        if self.confidence.is_none() {
            self.confidence = other.confidence;
        }
        if self.sentiment.is_none() {
            self.sentiment = other.sentiment;
        }
    }

    /// Default whatever is still missing.
    pub fn finish(self) -> ExtractedResult {
        let defaults = ExtractedResult::default();
        ExtractedResult {
            response: self.response.unwrap_or(defaults.response),
            confidence: self.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            sentiment: self.sentiment.unwrap_or_default(),
        }
    }
}

/// An empty or whitespace-only capture is a failed capture.
pub fn accept_response(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

/// Parse and range-check a captured confidence. Out-of-range values are
/// dropped, not clamped.
pub fn accept_confidence(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().and_then(accept_confidence_value)
}

pub fn accept_confidence_value(value: f64) -> Option<f64> {
    // abs() folds -0.0 into 0.0
    (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(value.abs())
}

pub fn accept_sentiment(raw: &str) -> Option<Sentiment> {
    raw.parse().ok()
}

/// Decode backslash escapes inside a quoted literal.
///
/// Recognises `\\`, `\'`, `\"`, `\n`, `\r` and `\t`; any other escape is kept
/// as written.
pub fn unescape_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// The prefix of `raw` the patterns are allowed to scan, cut on a char boundary.
pub fn scan_window(raw: &str) -> &str {
    if raw.len() <= MAX_SCAN_BYTES {
        return raw;
    }
    let mut end = MAX_SCAN_BYTES;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
