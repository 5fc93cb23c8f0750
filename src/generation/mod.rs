//! The generative-model boundary.
//!
//! Everything that needs a language model goes through [`Generator`], which
//! has three call shapes: a streamed chat completion, a plain completion and
//! a completion constrained to a JSON schema.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// An ordered, finite stream of text fragments.
///
/// The stream cannot be restarted; dropping it abandons the request.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A JSON schema the model's output must follow.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    /// Identifier sent to the provider.
    pub name: String,
    pub schema: serde_json::Value,
}

/// Black-box generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Stream a chat completion fragment by fragment.
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TextStream>;

    /// Complete a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Complete a single prompt with output constrained to `schema`.
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value>;
}

/// The first `max_chars` characters of a reply, for logs and error messages.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Extract a JSON document from a model reply, tolerating Markdown fences
/// and surrounding prose.
pub fn extract_json(response: &str) -> std::result::Result<serde_json::Value, serde_json::Error> {
    let trimmed = response.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find(['[', '{']);
    let end = trimmed.rfind([']', '}']);
    let json_str = match (start, end) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };

    serde_json::from_str(json_str)
}
