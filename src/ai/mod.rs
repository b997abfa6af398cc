pub mod gemini;
pub mod prompt;

use async_trait::async_trait;

/// Outcome of a summarization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Generated, non-blank text
    Text(String),
    /// The service answered without usable text
    Empty,
    /// The request failed
    Failed(String),
}

impl SummaryOutcome {
    /// Classify raw text from the service
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(text) if !text.trim().is_empty() => Self::Text(text),
            _ => Self::Empty,
        }
    }
}

/// Text-generation service used to write the digest body
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> SummaryOutcome;
}
