use super::prompt;
use super::NarrativeError;
use crate::config::NarrativeConfig;
use crate::diagnosis::IndicatorCatalog;
use crate::diagnosis::domain::{DiagnosisResult, ReportSuggestions};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Retries after the first attempt before the error propagates.
const MAX_RETRIES: u32 = 2;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Client for the hosted generative-text endpoint.
///
/// One schema-constrained `generateContent` call per uncompleted result;
/// transient failures are retried a bounded number of times, then the
/// error propagates so the caller can offer a retry path.
pub struct GeminiNarrator {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiNarrator {
    pub fn new(api_key: String, config: &NarrativeConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    pub async fn generate(
        &self,
        catalog: &IndicatorCatalog,
        result: &DiagnosisResult,
    ) -> Result<ReportSuggestions, NarrativeError> {
        let prompt = prompt::render(catalog, result);

        let mut attempt = 0;
        loop {
            match self.call(&prompt).await {
                Ok(suggestions) => return Ok(suggestions),
                Err(err) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(%err, attempt, "narrative generation attempt failed, retrying");
                    tokio::time::sleep(RETRY_PAUSE).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn call(&self, prompt: &str) -> Result<ReportSuggestions, NarrativeError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: suggestions_schema(),
            },
        };

        let response = self
            .http_client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateContentResponse>()
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                NarrativeError::Malformed("response contained no candidates".to_string())
            })?;

        serde_json::from_str::<ReportSuggestions>(text.trim())
            .map_err(|err| NarrativeError::Malformed(err.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Response schema matching `ReportSuggestions`, enforced provider-side.
fn suggestions_schema() -> serde_json::Value {
    let topic_analysis = |label: &str| {
        json!({
            "type": "OBJECT",
            "properties": {
                "currentStatus": {
                    "type": "STRING",
                    "description": format!("Detailed status analysis for the {label} area.")
                },
                "recommendations": {
                    "type": "ARRAY",
                    "description": format!("Two or three concrete recommendations for the {label} area."),
                    "items": { "type": "STRING" }
                }
            },
            "required": ["currentStatus", "recommendations"]
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "overallSummary": {
                "type": "STRING",
                "description": "Overall strategic assessment of the diagnosis."
            },
            "strengths": {
                "type": "ARRAY",
                "description": "Two or three key ESG strengths.",
                "items": { "type": "STRING" }
            },
            "weaknesses": {
                "type": "ARRAY",
                "description": "Two or three ESG gaps needing urgent improvement.",
                "items": { "type": "STRING" }
            },
            "detailedAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "E": topic_analysis("environment"),
                    "S": topic_analysis("social"),
                    "G": topic_analysis("governance")
                },
                "required": ["E", "S", "G"]
            }
        },
        "required": ["overallSummary", "strengths", "weaknesses", "detailedAnalysis"]
    })
}
