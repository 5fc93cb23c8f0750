//! Summaries of the ingested material.

use crate::config::Prompts;
use crate::error::StudyError;
use crate::generation::Generator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Shown when there is no text to summarize.
pub const EMPTY_SUMMARY: &str = "No summary available.";

/// Produces a Markdown summary of the source text.
pub struct Summarizer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    language: String,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn Generator>, prompts: Prompts, language: impl Into<String>) -> Self {
        Self {
            generator,
            prompts,
            language: language.into(),
        }
    }

    /// Summarize `text`. Never fails: problems are reported inside the
    /// returned text.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn summarize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return EMPTY_SUMMARY.to_string();
        }

        let mut vars = HashMap::new();
        vars.insert("language".to_string(), self.language.clone());
        vars.insert("text".to_string(), text.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.instruction, &vars);

        match self.generator.complete(&prompt).await {
            Ok(summary) => {
                info!("Generated summary ({} chars)", summary.len());
                summary.trim().to_string()
            }
            Err(StudyError::MissingCredentials(var)) => {
                warn!("Skipping summary: {} is not set", var);
                format!("API key not found. Set {} to generate a summary.", var)
            }
            Err(e) => {
                warn!("Summary generation failed: {}", e);
                format!("An error occurred while generating the summary: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::generation::{ChatMessage, OutputSchema, TextStream};
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Behaviour {
        Reply(&'static str),
        NoKey,
        Down,
    }

    struct FakeGenerator {
        behaviour: Behaviour,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn stream_chat(&self, _messages: Vec<ChatMessage>) -> Result<TextStream> {
            Err(StudyError::Generation("unsupported".to_string()))
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.to_string()),
                Behaviour::NoKey => Err(StudyError::MissingCredentials("OPENAI_API_KEY".to_string())),
                Behaviour::Down => Err(StudyError::OpenAI("service unavailable".to_string())),
            }
        }

        async fn complete_structured(
            &self,
            _prompt: &str,
            _schema: &OutputSchema,
        ) -> Result<serde_json::Value> {
            Err(StudyError::Generation("unsupported".to_string()))
        }
    }

    #[tokio::test]
    async fn test_summary_prompt_carries_text_and_language() {
        let generator = FakeGenerator::new(Behaviour::Reply("## Cells\n\nCells are small.\n"));
        let summarizer = Summarizer::new(generator.clone(), Prompts::default(), "Indonesian");

        let summary = summarizer.summarize("Cells are the unit of life.").await;
        assert_eq!(summary, "## Cells\n\nCells are small.");

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Cells are the unit of life."));
        assert!(prompts[0].contains("Indonesian"));
    }

    #[tokio::test]
    async fn test_missing_key_becomes_message() {
        let summarizer = Summarizer::new(FakeGenerator::new(Behaviour::NoKey), Prompts::default(), "English");
        let summary = summarizer.summarize("text").await;
        assert_eq!(summary, "API key not found. Set OPENAI_API_KEY to generate a summary.");
    }

    #[tokio::test]
    async fn test_service_failure_becomes_message() {
        let summarizer = Summarizer::new(FakeGenerator::new(Behaviour::Down), Prompts::default(), "English");
        let summary = summarizer.summarize("text").await;
        assert!(summary.starts_with("An error occurred while generating the summary:"));
        assert!(summary.contains("service unavailable"));
    }

    #[tokio::test]
    async fn test_empty_text_skips_service() {
        let generator = FakeGenerator::new(Behaviour::Reply("unused"));
        let summarizer = Summarizer::new(generator.clone(), Prompts::default(), "English");

        assert_eq!(summarizer.summarize("  \n").await, EMPTY_SUMMARY);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}
