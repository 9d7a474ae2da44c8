//! Extracting the structured research payload from a free-text knowledge
//! service response. The service is asked for bare JSON but routinely wraps
//! it in a markdown code fence anyway.

use crate::error::{ProspectError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer};

/// The research contract: one JSON object with these keys, each defaulted
/// when absent. No further schema enforcement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResearchFindings {
    #[serde(default)]
    pub overview: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub dc_count: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub truck_count: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub gate_fit_score: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub truck_fit_score: i64,
    #[serde(default)]
    pub hook: String,
    #[serde(default)]
    pub company_bullets: Vec<String>,
}

/// Numeric fields come back as integers, floats, or quoted numbers depending
/// on the model's mood; coerce all of them, defaulting to 0.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => crate::ingest::parse_count(&s),
        _ => 0,
    })
}

/// Strip an optional markdown code fence and parse the remaining text as one
/// JSON object. Fails with a parse error when no valid object can be
/// extracted.
pub fn parse_findings(text: &str) -> Result<ResearchFindings> {
    let candidate = extract_json_candidate(text);
    let findings: ResearchFindings =
        serde_json::from_str(&candidate).map_err(|e| ProspectError::ResearchParse {
            message: e.to_string(),
        })?;
    Ok(findings)
}

fn extract_json_candidate(text: &str) -> String {
    // Fenced block with the object inside
    let fenced = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap();
    if let Some(captures) = fenced.captures(text) {
        return captures[1].to_string();
    }

    // Unterminated or bare fence markers
    let mut candidate = text.trim().to_string();
    if candidate.starts_with("```") {
        candidate = Regex::new(r"^```\w*\n?")
            .unwrap()
            .replace(&candidate, "")
            .to_string();
        candidate = Regex::new(r"\n?```$")
            .unwrap()
            .replace(&candidate, "")
            .to_string();
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_object() {
        let findings = parse_findings(r#"{"overview": "Does things", "gate_fit_score": 70}"#)
            .unwrap();
        assert_eq!(findings.overview, "Does things");
        assert_eq!(findings.gate_fit_score, 70);
        assert_eq!(findings.truck_fit_score, 0);
        assert!(findings.company_bullets.is_empty());
    }

    #[test]
    fn parses_json_fenced_object() {
        let text = "Here you go:\n```json\n{\"gate_fit_score\": 60, \"truck_fit_score\": 60}\n```\nHope that helps.";
        let findings = parse_findings(text).unwrap();
        assert_eq!(findings.gate_fit_score, 60);
        assert_eq!(findings.truck_fit_score, 60);
    }

    #[test]
    fn parses_anonymous_fence() {
        let text = "```\n{\"overview\": \"A retailer\"}\n```";
        let findings = parse_findings(text).unwrap();
        assert_eq!(findings.overview, "A retailer");
    }

    #[test]
    fn coerces_stringly_numbers() {
        let findings =
            parse_findings(r#"{"dc_count": "1,200", "truck_count": 350.0, "gate_fit_score": "80"}"#)
                .unwrap();
        assert_eq!(findings.dc_count, 1_200);
        assert_eq!(findings.truck_count, 350);
        assert_eq!(findings.gate_fit_score, 80);
    }

    #[test]
    fn rejects_text_without_an_object() {
        let err = parse_findings("I could not find anything about this company.");
        assert!(matches!(
            err,
            Err(crate::error::ProspectError::ResearchParse { .. })
        ));
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(parse_findings("[1, 2, 3]").is_err());
    }
}
