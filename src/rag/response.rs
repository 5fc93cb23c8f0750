//! Streamed, grounded answers.

use super::{context::format_context_for_prompt, format_history, ContextBuilder, Turn};
use crate::config::{Prompts, RagSettings};
use crate::embedding::Embedder;
use crate::error::{Result, StudyError};
use crate::generation::{ChatMessage, Generator, TextStream};
use crate::index::Index;
use futures::{stream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Reply used when no material has been processed yet.
pub const INACTIVE_MESSAGE: &str =
    "Sorry, this chat is inactive. Please process the documents first.";

/// Marker appended to an answer while it is still streaming.
pub const CURSOR: char = '▌';

/// Answers questions from the indexed material.
pub struct Responder {
    generator: Arc<dyn Generator>,
    context_builder: ContextBuilder,
    prompts: Prompts,
    max_history_turns: usize,
    condense_question: bool,
}

impl Responder {
    pub fn new(
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        prompts: Prompts,
        settings: &RagSettings,
    ) -> Self {
        let context_builder = ContextBuilder::new(embedder)
            .with_max_chunks(settings.top_k)
            .with_min_score(settings.min_score);

        Self {
            generator,
            context_builder,
            prompts,
            max_history_turns: settings.max_history_turns,
            condense_question: settings.condense_question,
        }
    }

    /// Answer `query` as a stream of text fragments.
    ///
    /// Without an index the stream holds the inactive message only. Failures
    /// before the first fragment are delivered as the stream's only item.
    #[instrument(skip(self, index, history), fields(history = history.len()))]
    pub async fn respond(&self, query: &str, index: Option<&Index>, history: &[Turn]) -> TextStream {
        let Some(index) = index else {
            debug!("No index; answering with the inactive message");
            return Box::pin(stream::once(async { Ok::<_, StudyError>(INACTIVE_MESSAGE.to_string()) }));
        };

        match self.start_answer(query, index, history).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to start answer: {}", e);
                Box::pin(stream::once(async move { Err::<String, _>(e) }))
            }
        }
    }

    async fn start_answer(&self, query: &str, index: &Index, history: &[Turn]) -> Result<TextStream> {
        let search_query = if self.condense_question && !history.is_empty() {
            self.condense(query, history).await?
        } else {
            query.to_string()
        };

        let context_chunks = self.context_builder.build(&search_query, index).await?;
        info!("Answering with {} context chunks", context_chunks.len());

        let mut vars = HashMap::new();
        vars.insert(
            "context".to_string(),
            format_context_for_prompt(&context_chunks),
        );
        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &vars);

        let recent = &history[history.len().saturating_sub(self.max_history_turns)..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(recent.iter().map(Turn::to_message));
        messages.push(ChatMessage::user(query));

        self.generator.stream_chat(messages).await
    }

    /// Rephrase a follow-up question into a standalone one for retrieval.
    async fn condense(&self, query: &str, history: &[Turn]) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("history".to_string(), format_history(history));
        vars.insert("question".to_string(), query.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.rag.condense, &vars);

        let standalone = self.generator.complete(&prompt).await?;
        let standalone = standalone.trim();
        debug!("Condensed question: {}", standalone);

        if standalone.is_empty() {
            Ok(query.to_string())
        } else {
            Ok(standalone.to_string())
        }
    }
}

/// Fold a stream into the complete answer.
///
/// `on_fragment` receives the accumulated text after every fragment. The
/// first error ends the fold.
pub async fn collect_answer<F>(mut stream: TextStream, mut on_fragment: F) -> Result<String>
where
    F: FnMut(&str),
{
    let mut answer = String::new();
    while let Some(fragment) = stream.next().await {
        answer.push_str(&fragment?);
        on_fragment(&answer);
    }

    if answer.is_empty() {
        return Err(StudyError::Generation("Empty response from LLM".to_string()));
    }
    Ok(answer)
}

/// Text to show while an answer is still arriving.
pub fn render_partial(text: &str) -> String {
    format!("{}{}", text, CURSOR)
}
