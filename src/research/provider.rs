//! External knowledge service boundary. The orchestrator only sees
//! `ResearchProvider`; the Gemini client below is the production
//! implementation, tests substitute their own.

use crate::error::{ProspectError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Identity attributes sent with a research call. Missing fields are
/// substituted with an "Unknown" placeholder before prompt assembly.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub company_name: String,
    pub industry: String,
    pub num_locations: i64,
    pub employees: i64,
    pub website: String,
}

impl ResearchRequest {
    fn placeholder(value: &str) -> String {
        if value.trim().is_empty() {
            "Unknown".to_string()
        } else {
            value.to_string()
        }
    }

    fn placeholder_count(value: i64) -> String {
        if value == 0 {
            "Unknown".to_string()
        } else {
            value.to_string()
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            r#"Research "{company}" for a B2B sales conversation about distribution center security and truck parking.

Context from their data:
- Industry: {industry}
- Reported locations: {locations}
- Employees: {employees}
- Website: {website}

I need SPECIFIC, SOURCED information. Return JSON:

{{
    "overview": "1-2 sentence description of what this company does",
    "dc_count": <number of distribution centers, fulfillment centers, or warehouses. 0 if unknown>,
    "truck_count": <number of trucks/tractors in their fleet. 0 if they don't operate their own fleet>,
    "gate_fit_score": <0-100 score for gate automation fit>,
    "truck_fit_score": <0-100 score for truck parking fit>,
    "hook": "One recent news item, expansion, or key insight to use as a conversation starter. Be specific with dates.",
    "company_bullets": [
        "Key fact about their logistics operations (source)",
        "Recent expansion or news item (source, date)",
        "Another relevant detail for sales conversation (source)"
    ]
}}

SCORING - BE STRICT:
- gate_fit_score: 90+ = 50+ DCs confirmed, 70-89 = 20-49 DCs, 50-69 = 5-19 DCs, <50 = few/unknown
- truck_fit_score: 90+ = 1000+ trucks confirmed, 70-89 = 500-999, 50-69 = 100-499, <50 = small/no fleet

For BULLETS - include the source in parentheses.

Return ONLY valid JSON, no markdown formatting."#,
            company = self.company_name,
            industry = Self::placeholder(&self.industry),
            locations = Self::placeholder_count(self.num_locations),
            employees = Self::placeholder_count(self.employees),
            website = Self::placeholder(&self.website),
        )
    }
}

/// One bounded research attempt per call; no internal retry loop. The raw
/// response text goes back to the caller for parsing.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn research(&self, request: &ResearchRequest) -> Result<String>;
}

/// Gemini REST client with search grounding enabled.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(model: String, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProspectError::Config("GEMINI_API_KEY not set".to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl ResearchProvider for GeminiProvider {
    async fn research(&self, request: &ResearchRequest) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": request.prompt() }] }],
            "tools": [{ "google_search": {} }],
        });

        debug!("Issuing research call for {}", request.company_name);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProspectError::Research {
                message: format!("knowledge service returned {status}: {detail}"),
            });
        }

        let payload: Value = response.json().await?;
        let text = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProspectError::Research {
                message: "knowledge service response contained no text".to_string(),
            });
        }
        Ok(text)
    }
}
