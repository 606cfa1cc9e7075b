//! The structured result recovered from free-form model output.
//!
//! Every reply the agent stores is reduced to an [`ExtractedResult`]: the
//! display text, a confidence score in `[0, 1]`, and a sentiment label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Response text used when nothing usable can be recovered from model output.
pub const DEFAULT_RESPONSE: &str =
    "I apologize, but I'm having trouble providing a response at the moment.";

/// Confidence used when the model output carries no valid score.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Coarse sentiment of an assistant reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing is exact: `"Positive"` or `" positive"` are rejected so that a
/// malformed label falls back to the default instead of being guessed at.
impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(format!("invalid sentiment: '{other}'")),
        }
    }
}

/// The (response, confidence, sentiment) triple.
///
/// `confidence` always lies in `[0.0, 1.0]` when produced by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedResult {
    pub response: String,
    pub confidence: f64,
    pub sentiment: Sentiment,
}

impl ExtractedResult {
    pub fn new(response: impl Into<String>, confidence: f64, sentiment: Sentiment) -> Self {
        Self {
            response: response.into(),
            confidence,
            sentiment,
        }
    }

    /// Whether this is exactly the fallback triple.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Render in the canonical structured-output shape:
    ///
    /// `AgentRunResult(data=AgentOutput(response='...', confidence=0.9, sentiment='positive'))`
    ///
    /// The response is quoted the way a repr would quote it: single quotes by
    /// default, double quotes when the text contains an apostrophe but no
    /// double quote. Backslashes, the active quote character, and control
    /// whitespace are escaped.
    pub fn to_canonical(&self) -> String {
        format!(
            "AgentRunResult(data=AgentOutput(response={}, confidence={:?}, sentiment='{}'))",
            quote_repr(&self.response),
            self.confidence,
            self.sentiment
        )
    }
}

impl Default for ExtractedResult {
    fn default() -> Self {
        Self {
            response: DEFAULT_RESPONSE.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            sentiment: Sentiment::Neutral,
        }
    }
}

fn quote_repr(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_roundtrip() {
        for sentiment in Sentiment::ALL {
            let parsed: Sentiment = sentiment.to_string().parse().unwrap();
            assert_eq!(sentiment, parsed);
        }
    }

    #[test]
    fn test_sentiment_parse_is_case_sensitive() {
        assert!("Positive".parse::<Sentiment>().is_err());
        assert!("NEUTRAL".parse::<Sentiment>().is_err());
        assert!(" negative".parse::<Sentiment>().is_err());
        assert!("happy".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_sentiment_serde() {
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
        let parsed: Sentiment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Sentiment::Negative);
    }

    #[test]
    fn test_default_triple() {
        let result = ExtractedResult::default();
        assert_eq!(result.response, DEFAULT_RESPONSE);
        assert!((result.confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert!(result.is_default());
    }

    #[test]
    fn test_canonical_single_quotes() {
        let result = ExtractedResult::new("Hello there", 0.9, Sentiment::Positive);
        assert_eq!(
            result.to_canonical(),
            "AgentRunResult(data=AgentOutput(response='Hello there', confidence=0.9, sentiment='positive'))"
        );
    }

    #[test]
    fn test_canonical_switches_to_double_quotes_for_apostrophe() {
        let result = ExtractedResult::new("It's sunny", 1.0, Sentiment::Neutral);
        assert_eq!(
            result.to_canonical(),
            "AgentRunResult(data=AgentOutput(response=\"It's sunny\", confidence=1.0, sentiment='neutral'))"
        );
    }

    #[test]
    fn test_canonical_escapes_when_both_quotes_present() {
        let result = ExtractedResult::new("He said \"it's\"\nok", 0.0, Sentiment::Negative);
        let canonical = result.to_canonical();
        assert!(canonical.contains(r#"response='He said "it\'s"\nok'"#));
    }

    #[test]
    fn test_extracted_result_serde() {
        let result = ExtractedResult::new("Hi", 0.25, Sentiment::Negative);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["response"], "Hi");
        assert_eq!(json["confidence"], 0.25);
        assert_eq!(json["sentiment"], "negative");
    }
}
