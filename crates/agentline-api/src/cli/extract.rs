//! Offline extraction: run the cascade on text without a service or model.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use agentline_core::extract::{Extraction, extract_with_trace};

#[derive(Debug, Serialize)]
struct ExtractionReport<'a> {
    #[serde(flatten)]
    extraction: Extraction,
    raw_output: &'a str,
}

/// Read the input from `text`, `file`, or stdin (in that order).
fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn report(raw: &str) -> Result<String> {
    let report = ExtractionReport {
        extraction: extract_with_trace(raw),
        raw_output: raw,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn run_extract(text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let raw = read_input(text, file)?;
    println!("{}", report(&raw)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_tier_and_raw_output() {
        let raw = r#"noise {"response": "Use a mutex.", "confidence": 0.8, "sentiment": "neutral"} noise"#;
        let value: serde_json::Value = serde_json::from_str(&report(raw).unwrap()).unwrap();
        assert_eq!(value["response"], "Use a mutex.");
        assert_eq!(value["confidence"], 0.8);
        assert_eq!(value["sentiment"], "neutral");
        assert_eq!(value["tier"], "json_keys");
        assert_eq!(value["raw_output"], raw);
    }

    #[test]
    fn file_input_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "response='From a file', confidence=0.6, sentiment='negative'").unwrap();
        assert_eq!(
            read_input(None, Some(path)).unwrap(),
            "response='From a file', confidence=0.6, sentiment='negative'"
        );
        assert_eq!(read_input(Some("inline".to_string()), None).unwrap(), "inline");
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        let value: serde_json::Value = serde_json::from_str(&report("").unwrap()).unwrap();
        assert_eq!(value["tier"], "default");
        assert_eq!(value["confidence"], 0.5);
    }
}
