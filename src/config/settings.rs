//! Configuration settings for the study helper.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub generation: GenerationSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub rag: RagSettings,
    pub video: VideoSettings,
    pub quiz: QuizSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (downloaded subtitles).
    pub temp_dir: String,
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl GeneralSettings {
    /// Tracing filter for the crate: `-v` flags win over the configured level.
    pub fn log_filter(&self, verbose: u8) -> String {
        let level = match verbose {
            0 => self.log_level.as_str(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        format!("study_helper={}", level)
    }
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/study-helper".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Default model identifier used when neither the environment nor the
/// config file names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model identifier. Overridden by the variable named in `model_env`.
    pub model: String,
    /// Base URL of an OpenAI-compatible endpoint (None = api.openai.com).
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Environment variable that overrides the model identifier.
    pub model_env: String,
    /// Sampling temperature for chat answers.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            model_env: "MODEL_NAME".to_string(),
            temperature: 0.3,
            timeout_seconds: 300,
        }
    }
}

impl GenerationSettings {
    /// Resolve the API key from the environment. Empty values count as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Resolve the model identifier: environment first, then config.
    pub fn resolved_model(&self) -> String {
        std::env::var(&self.model_env)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.model.clone())
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval-augmented answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Minimum similarity score for a chunk to be used as context.
    pub min_score: f32,
    /// How many of the most recent turns are sent along with a question.
    pub max_history_turns: usize,
    /// Rephrase follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: 0.0,
            max_history_turns: 20,
            condense_question: false,
        }
    }
}

/// Video transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Transcript languages in order of preference.
    pub languages: Vec<String>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            languages: vec!["id".to_string(), "en".to_string()],
        }
    }
}

/// Quiz sizing and grading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    /// Words of source material per question.
    pub words_per_question: usize,
    /// Lower bound on the number of questions.
    pub min_questions: usize,
    /// Upper bound on the number of questions.
    pub max_questions: usize,
    /// Score (0-100) at or above which a result counts as passed.
    pub pass_score: f64,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            words_per_question: 200,
            min_questions: 3,
            max_questions: 10,
            pass_score: 70.0,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Natural language used for summaries and quizzes.
    pub language: String,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            custom_dir: None,
            language: "English".to_string(),
            variables: std::collections::HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject combinations the pipeline cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::StudyError;

        if self.chunking.chunk_size == 0 || self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(StudyError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.quiz.min_questions > self.quiz.max_questions || self.quiz.words_per_question == 0 {
            return Err(StudyError::Config(
                "quiz.min_questions must not exceed quiz.max_questions and words_per_question must be positive"
                    .to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(StudyError::Config(format!(
                "general.log_level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.general.log_level
            )));
        }
        if self.video.languages.is_empty() {
            return Err(StudyError::Config(
                "video.languages must name at least one language".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("study-helper")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}
