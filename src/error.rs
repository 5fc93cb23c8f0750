//! Error types for the study helper.

use thiserror::Error;

/// Library-level error type for study helper operations.
#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not extract any text from the provided source")]
    EmptySource,

    #[error("Video source error: {0}")]
    VideoSource(String),

    #[error("No transcript available for video {0}")]
    TranscriptUnavailable(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("API key not found. Set {0} to enable generation.")]
    MissingCredentials(String),

    #[error("Malformed structured output: {0}")]
    Schema(String),

    #[error("{0}")]
    NotReady(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<lopdf::Error> for StudyError {
    fn from(err: lopdf::Error) -> Self {
        StudyError::Pdf(err.to_string())
    }
}

impl StudyError {
    /// Whether the user can simply retry the action that produced this error.
    ///
    /// Everything except a broken configuration leaves the session as it was.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StudyError::Config(_))
    }
}

/// Result type alias for study helper operations.
pub type Result<T> = std::result::Result<T, StudyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_message_names_variable() {
        let err = StudyError::MissingCredentials("OPENAI_API_KEY".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_error_not_recoverable() {
        assert!(!StudyError::Config("bad".to_string()).is_recoverable());
    }
}
