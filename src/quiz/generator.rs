//! Quiz generation through structured model output.

use super::{Quiz, QuizItem};
use crate::config::Prompts;
use crate::error::{Result, StudyError};
use crate::generation::{Generator, OutputSchema};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// JSON schema for the quiz reply.
///
/// Strict structured output needs an object at the root, so the items are
/// wrapped in `questions`.
pub fn quiz_schema() -> OutputSchema {
    OutputSchema {
        name: "quiz".to_string(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": { "type": "string" },
                            "options": {
                                "type": "array",
                                "items": { "type": "string" }
                            },
                            "correct_answer": { "type": "string" }
                        },
                        "required": ["question", "options", "correct_answer"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["questions"],
            "additionalProperties": false
        }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuizReply {
    Wrapped { questions: Vec<QuizItem> },
    Bare(Vec<QuizItem>),
}

/// Generates validated quizzes.
pub struct QuizGenerator {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    language: String,
}

impl QuizGenerator {
    pub fn new(generator: Arc<dyn Generator>, prompts: Prompts, language: impl Into<String>) -> Self {
        Self {
            generator,
            prompts,
            language: language.into(),
        }
    }

    /// Generate a quiz of `count` questions about `text`.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn generate(&self, text: &str, count: usize) -> Result<Quiz> {
        let mut vars = HashMap::new();
        vars.insert("count".to_string(), count.to_string());
        vars.insert("language".to_string(), self.language.clone());
        vars.insert("text".to_string(), text.to_string());
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.quiz.instruction, &vars);

        let reply = self
            .generator
            .complete_structured(&prompt, &quiz_schema())
            .await?;

        let quiz = parse_quiz(reply, count)?;
        info!("Generated quiz with {} questions", quiz.len());
        Ok(quiz)
    }
}

/// Parse and validate a model reply into a quiz of at most `count` items.
pub fn parse_quiz(reply: serde_json::Value, count: usize) -> Result<Quiz> {
    let mut items = match serde_json::from_value(reply) {
        Ok(QuizReply::Wrapped { questions }) => questions,
        Ok(QuizReply::Bare(items)) => items,
        Err(e) => return Err(StudyError::Schema(format!("unexpected quiz shape: {}", e))),
    };

    if items.is_empty() {
        return Err(StudyError::Schema("the quiz has no questions".to_string()));
    }
    for item in &items {
        item.validate()?;
    }

    if items.len() > count {
        warn!("Model returned {} questions, keeping {}", items.len(), count);
        items.truncate(count);
    } else if items.len() < count {
        warn!("Model returned {} of {} requested questions", items.len(), count);
    }

    Ok(Quiz::new(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{ChatMessage, TextStream};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn item_json(n: usize) -> serde_json::Value {
        json!({
            "question": format!("Question {n}?"),
            "options": ["alpha", "beta", "gamma", "delta"],
            "correct_answer": "beta"
        })
    }

    struct StructuredGenerator {
        reply: Result<serde_json::Value>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for StructuredGenerator {
        async fn stream_chat(&self, _messages: Vec<ChatMessage>) -> Result<TextStream> {
            Err(StudyError::Generation("unsupported".to_string()))
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(StudyError::Generation("unsupported".to_string()))
        }

        async fn complete_structured(
            &self,
            prompt: &str,
            schema: &OutputSchema,
        ) -> Result<serde_json::Value> {
            assert_eq!(schema.name, "quiz");
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(value) => Ok(value.clone()),
                Err(_) => Err(StudyError::MissingCredentials("OPENAI_API_KEY".to_string())),
            }
        }
    }

    #[test]
    fn test_parse_wrapped_and_bare() {
        let wrapped = json!({ "questions": [item_json(1), item_json(2), item_json(3)] });
        assert_eq!(parse_quiz(wrapped, 3).unwrap().len(), 3);

        let bare = json!([item_json(1), item_json(2), item_json(3)]);
        assert_eq!(parse_quiz(bare, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_truncates_extra_questions() {
        let reply = json!({ "questions": (0..5).map(item_json).collect::<Vec<_>>() });
        let quiz = parse_quiz(reply, 3).unwrap();
        assert_eq!(quiz.len(), 3);
        assert_eq!(quiz.items[2].question, "Question 2?");
    }

    #[test]
    fn test_parse_accepts_fewer_questions() {
        let reply = json!({ "questions": [item_json(0), item_json(1)] });
        assert_eq!(parse_quiz(reply, 4).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(matches!(
            parse_quiz(json!({ "questions": [] }), 3),
            Err(StudyError::Schema(_))
        ));
        assert!(matches!(
            parse_quiz(json!({ "quiz": "nope" }), 3),
            Err(StudyError::Schema(_))
        ));

        let wrong_answer = json!([{
            "question": "Q?",
            "options": ["a", "b", "c", "d"],
            "correct_answer": "z"
        }]);
        assert!(matches!(parse_quiz(wrong_answer, 3), Err(StudyError::Schema(_))));
    }

    #[test]
    fn test_schema_root_is_object() {
        let schema = quiz_schema();
        assert_eq!(schema.schema["type"], "object");
        assert_eq!(
            schema.schema["properties"]["questions"]["items"]["required"],
            json!(["question", "options", "correct_answer"])
        );
    }

    #[tokio::test]
    async fn test_generate_renders_count_and_language() {
        let generator = Arc::new(StructuredGenerator {
            reply: Ok(json!({ "questions": [item_json(0), item_json(1), item_json(2)] })),
            prompts: Mutex::new(Vec::new()),
        });
        let quizzes = QuizGenerator::new(generator.clone(), Prompts::default(), "Indonesian");

        let quiz = quizzes.generate("Photosynthesis makes sugar.", 3).await.unwrap();
        assert_eq!(quiz.len(), 3);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("exactly 3 questions"));
        assert!(prompts[0].contains("Indonesian"));
        assert!(prompts[0].contains("Photosynthesis makes sugar."));
    }

    #[tokio::test]
    async fn test_generate_propagates_service_errors() {
        let generator = Arc::new(StructuredGenerator {
            reply: Err(StudyError::Generation("down".to_string())),
            prompts: Mutex::new(Vec::new()),
        });
        let quizzes = QuizGenerator::new(generator, Prompts::default(), "English");

        let err = quizzes.generate("text", 3).await.unwrap_err();
        assert!(matches!(err, StudyError::MissingCredentials(_)));
    }
}
