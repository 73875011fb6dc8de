//! Google Gemini text model.
//!
//! Calls `generateContent` on the Generative Language API with a system
//! instruction and a single user turn. JSON-array requests ask the API for a
//! schema-constrained response.

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{CoachError, GenerationRequest, ResponseFormat, TextModel};
use crate::config::CoachConfig;
use crate::constants::{GEMINI_API_BASE_URL, GEMINI_DEFAULT_MODEL};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

/// Gemini client for the coach
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with an API key. An empty key is accepted here and
    /// rejected on first use.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into().trim().to_string(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE_URL.to_string(),
        }
    }

    /// Build a client from the `[coach]` section and the key captured at startup
    pub fn from_config(config: &CoachConfig, api_key: Option<&str>) -> Self {
        Self::new(api_key.unwrap_or_default()).with_model(config.model.clone())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at another API root (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }

    fn build_request(request: &GenerationRequest) -> GeminiRequest {
        let generation_config = match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonStringArray => Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
            }),
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            system_instruction: request.system_instruction.as_ref().map(|instruction| GeminiContent {
                role: None,
                parts: vec![ContentPart {
                    text: Some(instruction.clone()),
                }],
            }),
            generation_config,
        }
    }

    fn map_api_error(status: u16, response_text: &str) -> CoachError {
        let message = serde_json::from_str::<GeminiResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.trim().to_string(), |e| e.message);
        CoachError::Api { status, message }
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(response: GeminiResponse) -> String {
        response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, CoachError> {
        if !self.has_api_key() {
            return Err(CoachError::MissingApiKey);
        }

        debug!("Sending request to Gemini model {}", self.model);
        let response = self
            .client
            .post(self.build_url())
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| CoachError::Network(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| CoachError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!("Gemini API error {}: {}", status, response_text);
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse Gemini response: {} ({})", e, response_text);
            CoachError::InvalidResponse(format!("Failed to parse Gemini response: {e}"))
        })?;

        Ok(Self::extract_text(gemini_response))
    }
}
