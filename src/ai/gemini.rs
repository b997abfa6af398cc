use crate::ai::{Summarizer, SummaryOutcome};
use crate::error::{DigestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini API client
pub struct GeminiClient {
    api_key: String,
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set the API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Generate text for a prompt. `Ok(None)` means the response carried no text.
    pub async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DigestError::gemini(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response.json().await?;

        // Concatenate the text parts of the first candidate
        let text = body.candidates.into_iter().next().and_then(|candidate| {
            let parts = candidate.content?.parts;
            let text: String = parts.into_iter().filter_map(|p| p.text).collect();
            Some(text)
        });

        Ok(text)
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, prompt: &str) -> SummaryOutcome {
        info!(model = %self.model, "Generating digest with Gemini");
        match self.generate(prompt).await {
            Ok(text) => SummaryOutcome::from_text(text),
            // Logged once by the renderer when it picks the fallback
            Err(e) => SummaryOutcome::Failed(e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
