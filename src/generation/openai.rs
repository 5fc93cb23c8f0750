//! OpenAI-compatible generation service.

use super::{
    extract_json, preview, ChatMessage, Generator, OutputSchema, Role, TextStream,
};
use crate::config::GenerationSettings;
use crate::error::{Result, StudyError};
use crate::openai::{create_client, OpenAIClient};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, instrument};

/// Generation service backed by the OpenAI chat completions API, or any
/// endpoint speaking the same protocol.
pub struct OpenAIGenerator {
    client: OpenAIClient,
    model: String,
    temperature: f32,
    api_key_env: String,
    has_key: bool,
}

impl OpenAIGenerator {
    /// Create a generator, resolving the API key and model from the environment.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let model = settings.resolved_model();
        info!("Using generation model {}", model);

        Ok(Self {
            client: create_client(settings)?,
            model,
            temperature: settings.temperature,
            api_key_env: settings.api_key_env.clone(),
            has_key: settings.api_key().is_some(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.has_key {
            Ok(())
        } else {
            Err(StudyError::MissingCredentials(self.api_key_env.clone()))
        }
    }

    fn to_request_message(message: ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let converted = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content)
                .build()
                .map_err(|e| StudyError::Generation(e.to_string()))?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content)
                .build()
                .map_err(|e| StudyError::Generation(e.to_string()))?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content)
                .build()
                .map_err(|e| StudyError::Generation(e.to_string()))?
                .into(),
        };
        Ok(converted)
    }

    async fn single_completion(
        &self,
        prompt: &str,
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        self.ensure_credentials()?;

        let messages = vec![Self::to_request_message(ChatMessage::user(prompt))?];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages);
        if let Some(format) = response_format {
            builder.response_format(format);
        }
        let request = builder
            .build()
            .map_err(|e| StudyError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| StudyError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| StudyError::Generation("Empty response from LLM".to_string()))?;

        debug!("Completion: {}", preview(&content, 200));
        Ok(content)
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TextStream> {
        self.ensure_credentials()?;

        let messages = messages
            .into_iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| StudyError::Generation(e.to_string()))?;

        let mut upstream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| StudyError::OpenAI(format!("Failed to start stream: {}", e)))?;

        let stream = try_stream! {
            while let Some(result) = upstream.next().await {
                let chunk = result
                    .map_err(|e| StudyError::OpenAI(format!("Stream error: {}", e)))?;
                for choice in chunk.choices {
                    if let Some(text) = choice.delta.content {
                        if !text.is_empty() {
                            yield text;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.single_completion(prompt, None).await
    }

    #[instrument(skip(self, prompt, schema), fields(schema = %schema.name))]
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value> {
        let format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: schema.name.clone(),
                schema: Some(schema.schema.clone()),
                strict: Some(true),
            },
        };

        let content = self.single_completion(prompt, Some(format)).await?;

        extract_json(&content).map_err(|e| {
            StudyError::Schema(format!(
                "{}. Response was: {}",
                e,
                preview(&content, 500)
            ))
        })
    }
}
