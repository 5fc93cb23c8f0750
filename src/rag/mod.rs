//! RAG (Retrieval-Augmented Generation) for answering questions about the
//! ingested material.

pub mod context;
mod response;

pub use context::ContextBuilder;
pub use response::{collect_answer, render_partial, Responder, CURSOR, INACTIVE_MESSAGE};

use crate::generation::ChatMessage;
use crate::index::SearchResult;
use serde::{Deserialize, Serialize};

/// A retrieved excerpt used as answer context.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Position of the chunk in the source.
    pub index: usize,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            index: result.chunk.index,
            content: result.chunk.content,
            score: result.score,
        }
    }
}

/// Who said a turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Speaker,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            content: content.into(),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            Speaker::User => ChatMessage::user(self.content.clone()),
            Speaker::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

/// Format turns as a plain-text conversation.
pub fn format_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| match turn.role {
            Speaker::User => format!("User: {}", turn.content),
            Speaker::Assistant => format!("Assistant: {}", turn.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
