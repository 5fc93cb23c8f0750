//! Source material handling.
//!
//! A [`Submission`] collects what the user provided (PDF uploads and/or a
//! video link) and resolves to exactly one [`Source`]. The [`Extractor`]
//! turns a source into plain text.

pub mod pdf;
pub mod youtube;

pub use youtube::{extract_video_id, YtDlpTranscripts};

use crate::error::{Result, StudyError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// An uploaded PDF held in memory.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    /// File name, used for labels and log messages.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an upload from disk.
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// What the user submitted for processing.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub documents: Vec<PdfUpload>,
    pub video: Option<String>,
}

impl Submission {
    /// Resolve to a single source. Documents win over a video link.
    pub fn into_source(self) -> Result<Source> {
        if !self.documents.is_empty() {
            return Ok(Source::Documents(self.documents));
        }

        match self.video {
            Some(link) if !link.trim().is_empty() => Ok(Source::Video(link.trim().to_string())),
            _ => Err(StudyError::InvalidInput(
                "please upload a PDF or enter a video link".to_string(),
            )),
        }
    }
}

/// Type of material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Video,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Video => write!(f, "video"),
        }
    }
}

/// A resolved source, exactly one per ingestion.
#[derive(Debug, Clone)]
pub enum Source {
    Documents(Vec<PdfUpload>),
    Video(String),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Documents(_) => SourceKind::Pdf,
            Source::Video(_) => SourceKind::Video,
        }
    }

    /// Human-readable label: file names or the video link.
    pub fn label(&self) -> String {
        match self {
            Source::Documents(docs) => docs
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Source::Video(link) => link.clone(),
        }
    }
}

/// Extracted material, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub kind: SourceKind,
    pub label: String,
    pub text: String,
    pub word_count: usize,
    pub ingested_at: DateTime<Utc>,
}

impl SourceDocument {
    pub fn new(source: &Source, text: String) -> Self {
        Self {
            kind: source.kind(),
            label: source.label(),
            word_count: word_count(&text),
            text,
            ingested_at: Utc::now(),
        }
    }
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Resolves video transcripts.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript in `language`. `Ok(None)` when the video has no
    /// transcript in that language.
    async fn fetch(&self, video_id: &str, language: &str) -> Result<Option<String>>;
}

/// Turns a [`Source`] into plain text.
pub struct Extractor {
    transcripts: Arc<dyn TranscriptFetcher>,
    languages: Vec<String>,
}

impl Extractor {
    pub fn new(transcripts: Arc<dyn TranscriptFetcher>, languages: Vec<String>) -> Self {
        Self {
            transcripts,
            languages,
        }
    }

    /// Extract the text of a source.
    ///
    /// An empty string means the source had no extractable text.
    #[instrument(skip(self, source), fields(kind = %source.kind()))]
    pub async fn extract(&self, source: &Source) -> Result<String> {
        match source {
            Source::Documents(docs) => {
                info!("Extracting text from {} PDF(s)", docs.len());
                pdf::extract_documents(docs)
            }
            Source::Video(link) => self.fetch_transcript(link).await,
        }
    }

    async fn fetch_transcript(&self, link: &str) -> Result<String> {
        let video_id = extract_video_id(link).ok_or_else(|| {
            StudyError::InvalidInput(format!("not a recognizable video link: {}", link))
        })?;

        let mut last_error = None;
        for language in &self.languages {
            match self.transcripts.fetch(&video_id, language).await {
                Ok(Some(text)) => {
                    info!("Using {} transcript for {}", language, video_id);
                    return Ok(text);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Transcript lookup ({}) failed for {}: {}", language, video_id, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(StudyError::TranscriptUnavailable(video_id)))
    }
}
