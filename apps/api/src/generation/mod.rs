// AI text generation: drafts whole entries or a summary from free text.
// All LLM calls go through llm_client.

pub mod generator;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use crate::document::{Project, ResumeDocument, WorkExperience};
use crate::llm_client::LlmError;

pub use generator::LlmTextGenerator;

pub const MIN_DESCRIPTION_CHARS: usize = 20;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("text generation failed: {0}")]
    Llm(#[from] LlmError),
}

/// Produces best-effort partial records. Callers decide where they go.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn work_experience(&self, description: &str) -> Result<WorkExperience, GenerationError>;

    async fn project(&self, description: &str) -> Result<Project, GenerationError>;

    async fn summary(&self, document: &ResumeDocument) -> Result<String, GenerationError>;
}

/// Trims the free-text description and enforces the minimum length.
pub fn validate_description(description: &str) -> Result<&str, GenerationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::InvalidInput("Description is required".to_string()));
    }
    if trimmed.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(GenerationError::InvalidInput(format!(
            "Must be at least {MIN_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(trimmed)
}
