//! Gemini `generateContent` client

use super::traits::{Reasoner, ReasoningError};
use crate::config::ReasoningSettings;
use crate::network::{HttpClient, ServiceRequest, ServiceResponse};
use crate::pipeline::Stage;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Gemini language model
pub struct GeminiReasoner {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiReasoner {
    pub fn new(
        client: HttpClient,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.0,
        }
    }

    /// Build from settings; `None` without an API key
    pub fn from_settings(client: HttpClient, settings: &ReasoningSettings) -> Option<Self> {
        let api_key = settings.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(
            Self::new(client, &settings.endpoint, &settings.model, api_key)
                .with_temperature(settings.temperature),
        )
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn request(&self, prompt: &str) -> ServiceRequest {
        ServiceRequest::post(format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model
        ))
        .param("key", &self.api_key)
        .json(serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": self.temperature },
        }))
    }

    fn parse(response: ServiceResponse) -> Result<String, ReasoningError> {
        if !response.is_success() {
            return Err(if response.is_rate_limited() {
                ReasoningError::Quota
            } else if response.is_unauthorized() {
                ReasoningError::Auth
            } else {
                ReasoningError::Provider(format!("HTTP {}", response.status))
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&response.text)
            .map_err(|e| ReasoningError::Malformed(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl Reasoner for GeminiReasoner {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, stage: Stage, prompt: &str) -> Result<String, ReasoningError> {
        debug!("Calling {} for {} ({} prompt chars)", self.model, stage, prompt.len());
        let response = self.client.execute(self.request(prompt)).await?;
        Self::parse(response)
    }
}
