//! Prompt templates for the study helper.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern is valid")
});

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub summary: SummaryPrompts,
    pub quiz: QuizPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for grounded question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System instruction; `{{context}}` receives the retrieved excerpts.
    pub system: String,
    /// Rewrites a follow-up into a standalone question.
    pub condense: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a friendly study assistant. Answer the question using only the context below, taken from the material the user provided.

If the answer is not in the context, say politely that the information is not in the material. Do not make up an answer.

Context:
{{context}}"#
                .to_string(),

            condense: r#"Given the conversation below and a follow-up question, rephrase the follow-up question to be a standalone question. Reply with the question only.

Conversation:
{{history}}

Follow-up question: {{question}}
Standalone question:"#
                .to_string(),
        }
    }
}

/// Prompt for the initial summary of the material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub instruction: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            instruction: r###"You are an AI assistant skilled at summarizing study material.
Below is the text of a document or video provided by the user. Write a clear and informative summary in {{language}}.
Only use what the text says. If something cannot be answered from the text, say politely that it is not covered by the material. Never make up facts.

Formatting rules:
- Write in paragraphs, one topic per paragraph.
- Give every topic a header in the form "## Header".
- Put a blank line after every header and every paragraph.
- When information reads better as a list, use bullet points.

Material:
---
{{text}}
---

Write the summary:"###
                .to_string(),
        }
    }
}

/// Prompt for multiple-choice quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    pub instruction: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            instruction: r#"You are a teacher who is an expert at writing quizzes.
Based on the material below, write a multiple-choice quiz of exactly {{count}} questions in {{language}}.
Every question has exactly 4 answer options: one correct answer and 3 plausible distractors. All options must be different.
Make sure the correct answer appears verbatim in the list of options.

Material:
---
{{text}}
---"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let quiz_path = custom_path.join("quiz.toml");
            if quiz_path.exists() {
                let content = std::fs::read_to_string(&quiz_path)?;
                prompts.quiz = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass, so `{{...}}` inside a
    /// substituted value is left as is. Unknown placeholders stay in place.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
