//! One matcher per cascade tier.
//!
//! All patterns run on the `regex` crate's linear-time engine. There are no
//! look-arounds or back-references; quoted bodies are matched with
//! escape-aware classes such as `(?:[^'\\]|\\.)*` instead.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::fields::{
    MAX_CLEANUP_CHARS, Partial, accept_confidence, accept_confidence_value, accept_response,
    accept_sentiment, truncate_chars, unescape_quoted,
};

/// Unsigned or signed decimal, optionally with an exponent. Range is checked later.
const NUMBER: &str = r"-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][-+]?[0-9]+)?";

/// `'...'` in group `a`, `"..."` in group `b`.
fn quoted(a: &str, b: &str) -> String {
    format!(r#"(?:'(?P<{a}>(?:[^'\\]|\\.)*)'|"(?P<{b}>(?:[^"\\]|\\.)*)")"#)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction pattern is valid")
}

static CANONICAL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"(?s)AgentRunResult\(data=AgentOutput\(response={}, confidence=(?P<conf>{NUMBER}), sentiment='(?P<sent>[^'\\]*)'\)\)",
        quoted("rs", "rd")
    ))
});

static RELAXED_RESPONSE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"(?s)\bresponse={}", quoted("rs", "rd"))));
static RELAXED_CONFIDENCE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"\bconfidence=(?P<conf>{NUMBER})")));
static RELAXED_SENTIMENT: Lazy<Regex> =
    Lazy::new(|| compile(r#"\bsentiment=(?:'(?P<ss>[^'\\]*)'|"(?P<sd>[^"\\]*)")"#));

static JSON_RESPONSE: Lazy<Regex> =
    Lazy::new(|| compile(r#"(?s)"response"\s*:\s*(?P<lit>"(?:[^"\\]|\\.)*")"#));
static JSON_CONFIDENCE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r#""confidence"\s*:\s*(?P<conf>{NUMBER})"#)));
static JSON_SENTIMENT: Lazy<Regex> =
    Lazy::new(|| compile(r#""sentiment"\s*:\s*"(?P<sent>[^"\\]*)""#));

static CONSTRUCTOR_BODY: Lazy<Regex> = Lazy::new(|| compile(r"(?s)AgentOutput\((?P<body>.*?)\)"));
static BODY_RESPONSE: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r#"(?s)['"]?\bresponse['"]?\s*[=:]\s*(?:{}|(?P<bare>[^,'"]+))"#,
        quoted("rs", "rd")
    ))
});
static BODY_CONFIDENCE: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r#"['"]?\bconfidence['"]?\s*[=:]\s*['"]?(?P<conf>{NUMBER})"#
    ))
});
static BODY_SENTIMENT: Lazy<Regex> =
    Lazy::new(|| compile(r#"['"]?\bsentiment['"]?\s*[=:]\s*['"]?(?P<sent>[A-Za-z]+)"#));

static EMBEDDED_OBJECT: Lazy<Regex> = Lazy::new(|| compile(r"(?s)\{.*\}"));

/// Prose only: a run containing `=`, parentheses or braces is markup, not a sentence.
static SENTENCE: Lazy<Regex> = Lazy::new(|| compile(r"\b\p{Lu}[^.!?\n=(){}]{18,}[.!?]"));

/// Leftover text mentioning an error is a failure report, not a reply.
static ERROR_MENTION: Lazy<Regex> = Lazy::new(|| compile(r"(?i)error"));

static SCAFFOLDING: Lazy<Regex> = Lazy::new(|| {
    compile(r"final_result|Raw result string:|AgentRunResult|AgentOutput|data=|[()]")
});

/// Pull a quoted response out of whichever alternative matched.
fn quoted_response(caps: &Captures<'_>) -> Option<String> {
    caps.name("rs")
        .or_else(|| caps.name("rd"))
        .map(|m| unescape_quoted(m.as_str()))
        .and_then(accept_response)
}

fn named<'t>(caps: &Captures<'t>, names: &[&str]) -> Option<&'t str> {
    names.iter().find_map(|n| caps.name(n)).map(|m| m.as_str())
}

/// Tier 1: `AgentRunResult(data=AgentOutput(response=..., confidence=..., sentiment='...'))`.
pub fn canonical(text: &str) -> Partial {
    let Some(caps) = CANONICAL.captures(text) else {
        return Partial::default();
    };
    Partial {
        response: quoted_response(&caps),
        confidence: named(&caps, &["conf"]).and_then(accept_confidence),
        sentiment: named(&caps, &["sent"]).and_then(accept_sentiment),
    }
}

/// Tier 2: `response=`, `confidence=`, `sentiment=` anywhere, in any order.
pub fn relaxed(text: &str) -> Partial {
    Partial {
        response: RELAXED_RESPONSE
            .captures(text)
            .and_then(|c| quoted_response(&c)),
        confidence: RELAXED_CONFIDENCE
            .captures(text)
            .and_then(|c| named(&c, &["conf"]).and_then(accept_confidence)),
        sentiment: RELAXED_SENTIMENT
            .captures(text)
            .and_then(|c| named(&c, &["ss", "sd"]).and_then(accept_sentiment)),
    }
}

/// Tier 3: JSON-style `"key": value` pairs, no enclosing object required.
pub fn json_keys(text: &str) -> Partial {
    let response = JSON_RESPONSE.captures(text).and_then(|c| {
        let literal = named(&c, &["lit"])?;
        // Raw control characters make the literal invalid JSON; decode by hand then.
        let decoded = serde_json::from_str::<String>(literal)
            .unwrap_or_else(|_| unescape_quoted(&literal[1..literal.len() - 1]));
        accept_response(decoded)
    });
    Partial {
        response,
        confidence: JSON_CONFIDENCE
            .captures(text)
            .and_then(|c| named(&c, &["conf"]).and_then(accept_confidence)),
        sentiment: JSON_SENTIMENT
            .captures(text)
            .and_then(|c| named(&c, &["sent"]).and_then(accept_sentiment)),
    }
}

/// Tier 4: the argument list of the first `AgentOutput(...)`, read with
/// `key=value` or `key: value` pairs and optionally unquoted values.
pub fn constructor_body(text: &str) -> Partial {
    let Some(body) = CONSTRUCTOR_BODY
        .captures(text)
        .and_then(|c| c.name("body"))
        .map(|m| m.as_str())
    else {
        return Partial::default();
    };

    let response = BODY_RESPONSE.captures(body).and_then(|c| {
        quoted_response(&c).or_else(|| {
            c.name("bare")
                .map(|m| m.as_str().trim().to_string())
                .and_then(accept_response)
        })
    });
    Partial {
        response,
        confidence: BODY_CONFIDENCE
            .captures(body)
            .and_then(|c| named(&c, &["conf"]).and_then(accept_confidence)),
        sentiment: BODY_SENTIMENT
            .captures(body)
            .and_then(|c| named(&c, &["sent"]).and_then(accept_sentiment)),
    }
}

/// Tier 5: greedy first-`{`-to-last-`}` parsed as a JSON object.
///
/// Looser on value types than the key scan: numeric strings are accepted
/// for confidence.
pub fn embedded_json(text: &str) -> Partial {
    let Some(object) = EMBEDDED_OBJECT
        .find(text)
        .and_then(|m| serde_json::from_str::<serde_json::Value>(m.as_str()).ok())
    else {
        return Partial::default();
    };
    let Some(map) = object.as_object() else {
        return Partial::default();
    };

    let confidence = match map.get("confidence") {
        Some(serde_json::Value::Number(n)) => n.as_f64().and_then(accept_confidence_value),
        Some(serde_json::Value::String(s)) => accept_confidence(s),
        _ => None,
    };
    Partial {
        response: map
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .and_then(accept_response),
        confidence,
        sentiment: map
            .get("sentiment")
            .and_then(|v| v.as_str())
            .and_then(accept_sentiment),
    }
}

/// Tier 6: the first capitalised, punctuation-terminated sentence of at
/// least 20 characters on one line.
pub fn sentence(text: &str) -> Option<String> {
    SENTENCE
        .find(text)
        .map(|m| m.as_str().to_string())
        .and_then(accept_response)
}

/// Tier 7: the input with scaffolding tokens removed, if more than ten
/// characters remain and the input never mentions an error.
pub fn cleanup(text: &str) -> Option<String> {
    if ERROR_MENTION.is_match(text) {
        return None;
    }
    let cleaned = SCAFFOLDING.replace_all(text, "");
    let cleaned = cleaned.trim();
    if cleaned.chars().count() > 10 {
        Some(truncate_chars(cleaned, MAX_CLEANUP_CHARS).to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentline_types::extraction::Sentiment;

    #[test]
    fn all_patterns_compile() {
        for re in [
            &*CANONICAL,
            &*RELAXED_RESPONSE,
            &*RELAXED_CONFIDENCE,
            &*RELAXED_SENTIMENT,
            &*JSON_RESPONSE,
            &*JSON_CONFIDENCE,
            &*JSON_SENTIMENT,
            &*CONSTRUCTOR_BODY,
            &*BODY_RESPONSE,
            &*BODY_CONFIDENCE,
            &*BODY_SENTIMENT,
            &*EMBEDDED_OBJECT,
            &*SENTENCE,
            &*ERROR_MENTION,
            &*SCAFFOLDING,
        ] {
            assert!(!re.as_str().is_empty());
        }
    }

    #[test]
    fn canonical_accepts_double_quoted_response_with_apostrophe() {
        let text = r#"AgentRunResult(data=AgentOutput(response="It's raining.", confidence=0.7, sentiment='negative'))"#;
        let p = canonical(text);
        assert_eq!(p.response.as_deref(), Some("It's raining."));
        assert_eq!(p.confidence, Some(0.7));
        assert_eq!(p.sentiment, Some(Sentiment::Negative));
    }

    #[test]
    fn canonical_honours_escaped_quotes() {
        let text = r"AgentRunResult(data=AgentOutput(response='don\'t panic', confidence=1.0, sentiment='neutral'))";
        let p = canonical(text);
        assert_eq!(p.response.as_deref(), Some("don't panic"));
        assert!(p.is_complete());
    }

    #[test]
    fn canonical_requires_fixed_field_order() {
        let text = "AgentRunResult(data=AgentOutput(confidence=0.9, response='x', sentiment='positive'))";
        assert!(canonical(text).is_empty());
    }

    #[test]
    fn relaxed_is_order_insensitive() {
        let text = "sentiment='negative' ... noise ... confidence=0.25 and response=\"Late answer\"";
        let p = relaxed(text);
        assert_eq!(p.response.as_deref(), Some("Late answer"));
        assert_eq!(p.confidence, Some(0.25));
        assert_eq!(p.sentiment, Some(Sentiment::Negative));
    }

    #[test]
    fn relaxed_drops_unknown_sentiment_label() {
        let p = relaxed("response='ok then', confidence=0.4, sentiment='Happy'");
        assert!(p.sentiment.is_none());
        assert_eq!(p.confidence, Some(0.4));
    }

    #[test]
    fn json_keys_tolerate_newlines_around_colon() {
        let text = "final_result\n{\n\"response\"\n:\n\"The capital of France is Paris.\"\n,\n\"confidence\"\n: \n0.9\n,\n\"sentiment\"\n: \n\"positive\"\n}";
        let p = json_keys(text);
        assert_eq!(p.response.as_deref(), Some("The capital of France is Paris."));
        assert_eq!(p.confidence, Some(0.9));
        assert_eq!(p.sentiment, Some(Sentiment::Positive));
    }

    #[test]
    fn json_keys_decode_escapes() {
        let p = json_keys(r#""response": "line one\nline \"two\" \u00e9""#);
        assert_eq!(p.response.as_deref(), Some("line one\nline \"two\" é"));
    }

    #[test]
    fn json_keys_fall_back_when_literal_has_raw_newline() {
        let p = json_keys("\"response\": \"first\nsecond\"");
        assert_eq!(p.response.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn constructor_body_reads_colon_pairs_and_bare_values() {
        let p = constructor_body("AgentOutput(response: Bare answer here, confidence: 0.6, sentiment: positive)");
        assert_eq!(p.response.as_deref(), Some("Bare answer here"));
        assert_eq!(p.confidence, Some(0.6));
        assert_eq!(p.sentiment, Some(Sentiment::Positive));
    }

    #[test]
    fn constructor_body_stops_at_first_paren() {
        let p = constructor_body("AgentOutput(response='a', confidence=0.2) sentiment='negative'");
        assert_eq!(p.response.as_deref(), Some("a"));
        assert!(p.sentiment.is_none());
    }

    #[test]
    fn embedded_json_accepts_numeric_string_confidence() {
        let p = embedded_json(r#"noise {"response": "Hi", "confidence": "0.8", "sentiment": "positive"} noise"#);
        assert_eq!(p.confidence, Some(0.8));
        assert!(p.is_complete());
    }

    #[test]
    fn embedded_json_ignores_non_object_and_broken_json() {
        assert!(embedded_json("{not json}").is_empty());
        assert!(embedded_json("no braces at all").is_empty());
    }

    #[test]
    fn sentence_needs_capital_and_length() {
        assert_eq!(sentence("short. Tiny one."), None);
        assert_eq!(
            sentence("prefix text. Here is a proper sentence! more"),
            Some("Here is a proper sentence!".to_string())
        );
    }

    #[test]
    fn cleanup_strips_scaffolding() {
        assert_eq!(
            cleanup("Raw result string: AgentRunResult(some leftover words)"),
            Some("some leftover words".to_string())
        );
        assert_eq!(cleanup("AgentOutput()"), None);
    }

    #[test]
    fn sentence_accepts_non_ascii_capitals() {
        assert_eq!(
            sentence("É la vie est belle aujourd'hui mon ami."),
            Some("É la vie est belle aujourd'hui mon ami.".to_string())
        );
    }

    #[test]
    fn cleanup_refuses_error_reports() {
        assert_eq!(cleanup("An error occurred while contacting upstream service"), None);
        assert_eq!(cleanup("upstream ERROR: connection reset by peer"), None);
    }

    #[test]
    fn cleanup_truncates_long_text() {
        let long = "x".repeat(5000);
        assert_eq!(cleanup(&long).map(|s| s.chars().count()), Some(MAX_CLEANUP_CHARS));
    }
}
