//! Response extraction: recover `(response, confidence, sentiment)` from
//! arbitrarily shaped model output.
//!
//! Upstream output is not guaranteed to follow the requested schema, so
//! extraction runs an ordered cascade of matchers from the most structured
//! shape down to plain-text heuristics. The order is fixed by [`CASCADE`].
//!
//! - The first structural tier that yields all three valid fields wins
//!   outright.
//! - Otherwise fields are merged first-capture-wins in cascade order, so a
//!   lower tier never overrides a field a higher tier already recovered.
//! - A still-missing response comes from the sentence heuristic, then the
//!   raw-text cleanup, then the default. Missing confidence and sentiment
//!   take their defaults.
//!
//! [`extract`] is total: it never fails and never panics.

mod fields;
mod strategies;

use std::fmt;

use agentline_types::extraction::ExtractedResult;
use serde::Serialize;

pub use fields::{MAX_CLEANUP_CHARS, MAX_SCAN_BYTES};
use fields::{Partial, scan_window};

/// A step of the extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// `AgentRunResult(data=AgentOutput(response=..., confidence=..., sentiment=...))`.
    Canonical,
    /// `response=` / `confidence=` / `sentiment=` anywhere, any order.
    Relaxed,
    /// `"response": ...` style pairs without a well-formed object.
    JsonKeys,
    /// `key=value` or `key: value` pairs inside `AgentOutput(...)`.
    ConstructorBody,
    /// First `{` to last `}` parsed as JSON.
    EmbeddedJson,
    /// First capitalised sentence, response only.
    Sentence,
    /// Input minus scaffolding tokens, response only.
    Cleanup,
    /// The fixed fallback triple.
    Default,
}

/// Cascade order, highest structural confidence first.
pub const CASCADE: [Tier; 8] = [
    Tier::Canonical,
    Tier::Relaxed,
    Tier::JsonKeys,
    Tier::ConstructorBody,
    Tier::EmbeddedJson,
    Tier::Sentence,
    Tier::Cleanup,
    Tier::Default,
];

impl Tier {
    /// Structural tiers can supply all three fields; the rest only a response.
    pub fn is_structural(self) -> bool {
        self < Tier::Sentence
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Canonical => "canonical",
            Tier::Relaxed => "relaxed",
            Tier::JsonKeys => "json_keys",
            Tier::ConstructorBody => "constructor_body",
            Tier::EmbeddedJson => "embedded_json",
            Tier::Sentence => "sentence",
            Tier::Cleanup => "cleanup",
            Tier::Default => "default",
        }
    }

    fn recover(self, text: &str) -> Partial {
        match self {
            Tier::Canonical => strategies::canonical(text),
            Tier::Relaxed => strategies::relaxed(text),
            Tier::JsonKeys => strategies::json_keys(text),
            Tier::ConstructorBody => strategies::constructor_body(text),
            Tier::EmbeddedJson => strategies::embedded_json(text),
            Tier::Sentence => response_only(strategies::sentence(text)),
            Tier::Cleanup => response_only(strategies::cleanup(text)),
            Tier::Default => Partial::default(),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn response_only(response: Option<String>) -> Partial {
    Partial {
        response,
        ..Default::default()
    }
}

/// An extraction result together with the tier that decided it.
///
/// `tier` is the tier that produced a complete triple when one did;
/// otherwise the tier that supplied the response (or [`Tier::Default`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    #[serde(flatten)]
    pub result: ExtractedResult,
    pub tier: Tier,
}

/// Extract the triple from raw model output.
pub fn extract(raw: &str) -> ExtractedResult {
    extract_with_trace(raw).result
}

/// Like [`extract`], also reporting which tier decided the result.
pub fn extract_with_trace(raw: &str) -> Extraction {
    let text = scan_window(raw);
    let mut merged = Partial::default();
    let mut response_tier = Tier::Default;

    for tier in CASCADE {
        if !tier.is_structural() && merged.response.is_some() {
            break;
        }

        let partial = tier.recover(text);
        if partial.is_complete() {
            tracing::debug!(tier = %tier, "extraction matched a complete triple");
            return Extraction {
                result: partial.finish(),
                tier,
            };
        }
        if merged.response.is_none() && partial.response.is_some() {
            response_tier = tier;
        }
        merged.absorb(partial);
    }

    tracing::debug!(
        tier = %response_tier,
        has_confidence = merged.confidence.is_some(),
        has_sentiment = merged.sentiment.is_some(),
        "extraction merged partial fields"
    );
    Extraction {
        result: merged.finish(),
        tier: response_tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentline_types::extraction::{DEFAULT_RESPONSE, Sentiment};

    fn assert_triple(result: &ExtractedResult, response: &str, confidence: f64, sentiment: Sentiment) {
        assert_eq!(result.response, response);
        assert!(
            (result.confidence - confidence).abs() < f64::EPSILON,
            "confidence {} != {confidence}",
            result.confidence
        );
        assert_eq!(result.sentiment, sentiment);
    }

    fn assert_well_formed(result: &ExtractedResult) {
        assert!(!result.response.trim().is_empty());
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(Sentiment::ALL.contains(&result.sentiment));
    }

    #[test]
    fn cascade_order_is_fixed() {
        assert_eq!(
            CASCADE,
            [
                Tier::Canonical,
                Tier::Relaxed,
                Tier::JsonKeys,
                Tier::ConstructorBody,
                Tier::EmbeddedJson,
                Tier::Sentence,
                Tier::Cleanup,
                Tier::Default,
            ]
        );
        assert!(CASCADE.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(CASCADE.iter().filter(|t| t.is_structural()).count(), 5);
    }

    #[test]
    fn canonical_input() {
        let raw = "AgentRunResult(data=AgentOutput(response='The capital of France is Paris.', confidence=0.9, sentiment='positive'))";
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Canonical);
        assert_triple(&out.result, "The capital of France is Paris.", 0.9, Sentiment::Positive);
    }

    #[test]
    fn json_object_input() {
        let raw = r#"{"response": "Paris is the capital.", "confidence": 0.85, "sentiment": "neutral"}"#;
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::JsonKeys);
        assert_triple(&out.result, "Paris is the capital.", 0.85, Sentiment::Neutral);
    }

    #[test]
    fn out_of_range_confidence_falls_back() {
        let raw = "response='Partial data only', confidence=1.5, sentiment='positive'";
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Relaxed);
        assert_triple(&out.result, "Partial data only", 0.5, Sentiment::Positive);
    }

    #[test]
    fn unstructured_garbage_uses_cleanup() {
        let raw = "garbage €€€ no structure here";
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Cleanup);
        assert_triple(&out.result, raw, 0.5, Sentiment::Neutral);
    }

    #[test]
    fn accented_capital_starts_a_sentence() {
        let raw = "voilà, É la vie est belle aujourd'hui mon ami. {trailing";
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Sentence);
        assert_triple(&out.result, "É la vie est belle aujourd'hui mon ami.", 0.5, Sentiment::Neutral);
    }

    #[test]
    fn error_text_is_not_shown_as_a_reply() {
        let out = extract_with_trace("An error occurred while contacting upstream service");
        assert_eq!(out.tier, Tier::Default);
        assert_triple(&out.result, DEFAULT_RESPONSE, 0.5, Sentiment::Neutral);
    }

    #[test]
    fn short_garbage_uses_default() {
        let out = extract_with_trace("()) data=");
        assert_eq!(out.tier, Tier::Default);
        assert!(out.result.is_default());
    }

    #[test]
    fn empty_and_blank_input_use_default() {
        for raw in ["", "   ", "\n\t\n"] {
            let out = extract_with_trace(raw);
            assert_eq!(out.tier, Tier::Default);
            assert_triple(&out.result, DEFAULT_RESPONSE, 0.5, Sentiment::Neutral);
        }
    }

    #[test]
    fn plain_sentence_input() {
        let raw = "Some preamble. The weather in New York is sunny today. trailing noise";
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Sentence);
        assert_triple(
            &out.result,
            "The weather in New York is sunny today.",
            0.5,
            Sentiment::Neutral,
        );
    }

    #[test]
    fn canonical_beats_json_keys() {
        let raw = concat!(
            r#"{"response": "json answer", "confidence": 0.1, "sentiment": "negative"} "#,
            "AgentRunResult(data=AgentOutput(response='canonical answer', confidence=0.95, sentiment='positive'))"
        );
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Canonical);
        assert_triple(&out.result, "canonical answer", 0.95, Sentiment::Positive);
    }

    #[test]
    fn canonical_round_trip_is_stable() {
        let inputs = [
            "AgentRunResult(data=AgentOutput(response='The capital of France is Paris.', confidence=0.9, sentiment='positive'))",
            r#"AgentRunResult(data=AgentOutput(response="It's done.", confidence=1.0, sentiment='neutral'))"#,
            r"AgentRunResult(data=AgentOutput(response='Line\nbreak and \'both\' \x22quotes\x22', confidence=0.0, sentiment='negative'))",
        ];
        for raw in inputs {
            let first = extract(raw);
            let second = extract_with_trace(&first.to_canonical());
            assert_eq!(second.tier, Tier::Canonical, "re-serialized: {}", first.to_canonical());
            assert_eq!(first, second.result);
        }
    }

    #[test]
    fn round_trip_of_arbitrary_triples() {
        let triples = [
            ExtractedResult::new("He said \"hi\" and it's fine\\", 0.33, Sentiment::Positive),
            ExtractedResult::new("multi\nline\ttext", 1e-7, Sentiment::Negative),
            ExtractedResult::new("ünïcødé ✓", 0.5, Sentiment::Neutral),
        ];
        for triple in triples {
            let out = extract_with_trace(&triple.to_canonical());
            assert_eq!(out.tier, Tier::Canonical);
            assert_eq!(out.result, triple);
        }
    }

    #[test]
    fn degradation_moves_down_the_cascade() {
        let ladder = [
            "AgentRunResult(data=AgentOutput(response='Paris is lovely in spring.', confidence=0.8, sentiment='positive'))",
            "AgentOutput(response='Paris is lovely in spring.', confidence=0.8, sentiment='positive')",
            r#""response": "Paris is lovely in spring.", "confidence": 0.8, "sentiment": "positive""#,
            "AgentOutput(response: Paris is lovely in spring, confidence: 0.8, sentiment: positive)",
            r#"{"response": "Paris is lovely in spring.", "confidence": "0.8", "sentiment": "positive"}"#,
            "note: Paris is lovely in spring. probably",
            "paris is lovely in spring, probably",
            "",
        ];
        let tiers: Vec<Tier> = ladder.iter().map(|raw| extract_with_trace(raw).tier).collect();
        assert_eq!(tiers, CASCADE.to_vec());
    }

    #[test]
    fn partial_fields_merge_first_capture_wins() {
        // Relaxed supplies the response; the JSON scan supplies the rest.
        let raw = r#"response='From relaxed' "confidence": 0.3, "sentiment": "negative""#;
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Relaxed);
        assert_triple(&out.result, "From relaxed", 0.3, Sentiment::Negative);
    }

    #[test]
    fn lower_tier_never_overrides_captured_field() {
        let raw = r#"confidence=0.2 "response": "json reply", "confidence": 0.9"#;
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::JsonKeys);
        assert_triple(&out.result, "json reply", 0.2, Sentiment::Neutral);
    }

    #[test]
    fn metadata_without_response_takes_sentence() {
        let raw = "confidence=0.7 sentiment='positive' The answer is forty two, clearly.";
        let out = extract_with_trace(raw);
        assert_eq!(out.tier, Tier::Sentence);
        assert_triple(&out.result, "The answer is forty two, clearly.", 0.7, Sentiment::Positive);
    }

    #[test]
    fn empty_structured_response_is_a_failed_capture() {
        let raw = "AgentRunResult(data=AgentOutput(response='', confidence=0.9, sentiment='positive'))";
        let out = extract(raw);
        assert_ne!(out.response, "");
        assert!((out.confidence - 0.9).abs() < f64::EPSILON);
        assert_eq!(out.sentiment, Sentiment::Positive);
    }

    #[test]
    fn wrong_case_sentiment_is_dropped() {
        let out = extract(r#"{"response": "Fine.", "confidence": 0.6, "sentiment": "Positive"}"#);
        assert_eq!(out.response, "Fine.");
        assert_eq!(out.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn totality_on_hostile_inputs() {
        let nested_quotes = "'\"".repeat(5_000);
        let unbalanced = "{".repeat(10_000) + "AgentOutput(" + &"(".repeat(10_000);
        let huge = "response='".to_string() + &"a".repeat(MAX_SCAN_BYTES * 2);
        let inputs = [
            String::new(),
            " ".repeat(1000),
            nested_quotes,
            unbalanced,
            huge,
            "\u{0}\u{1}\u{7f}\u{fffd}".repeat(100),
            "AgentRunResult(data=AgentOutput(response='unterminated, confidence=0.9".to_string(),
            r#"{"response": 5, "confidence": true, "sentiment": null}"#.to_string(),
            "confidence=NaN sentiment='positive'".to_string(),
        ];
        for raw in &inputs {
            let out = extract(raw);
            assert_well_formed(&out);
        }
    }

    #[test]
    fn confidence_bound_and_sentiment_closure() {
        for raw in [
            "confidence=1.0000001",
            "confidence=-0",
            "\"confidence\": 1e3",
            "AgentOutput(response: x y z w, confidence: 0.999, sentiment: mixed)",
        ] {
            assert_well_formed(&extract(raw));
        }
    }

    #[test]
    fn cleanup_output_is_truncated() {
        let raw = "lowercase words only ".repeat(200);
        let out = extract_with_trace(&raw);
        assert_eq!(out.tier, Tier::Cleanup);
        assert_eq!(out.result.response.chars().count(), MAX_CLEANUP_CHARS);
    }

    #[test]
    fn extraction_serializes_flat() {
        let out = extract_with_trace("AgentRunResult(data=AgentOutput(response='Hi', confidence=0.4, sentiment='neutral'))");
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["response"], "Hi");
        assert_eq!(json["tier"], "canonical");
    }
}
