//! Session handlers.
//!
//! Coordinates extraction, chunking, indexing, answering, summarizing and
//! quizzing against an explicit [`StudySession`].

use crate::chunking::{ChunkingConfig, TextChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, StudyError};
use crate::generation::{Generator, OpenAIGenerator};
use crate::index::IndexBuilder;
use crate::quiz::{question_count, GradeReport, Quiz, QuizGenerator};
use crate::rag::{collect_answer, Responder, Turn};
use crate::session::{Material, StudySession};
use crate::source::{Extractor, SourceDocument, SourceKind, Submission, TranscriptFetcher, YtDlpTranscripts};
use crate::summary::Summarizer;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Shown when a quiz is requested before any material was processed.
pub const NO_MATERIAL_MESSAGE: &str = "Material not found, please process a document first.";

/// Prefix of the assistant turn recorded when answering fails.
pub const ANSWER_FAILED_PREFIX: &str = "Sorry, something went wrong while answering:";

/// Outcome of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub kind: SourceKind,
    pub label: String,
    pub word_count: usize,
    pub chunk_count: usize,
}

/// The study pipeline.
pub struct Pipeline {
    settings: Settings,
    extractor: Extractor,
    chunker: TextChunker,
    index_builder: IndexBuilder,
    responder: Responder,
    summarizer: Summarizer,
    quizzes: QuizGenerator,
}

impl Pipeline {
    /// Create a pipeline backed by the OpenAI-compatible API and yt-dlp.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let generator = Arc::new(OpenAIGenerator::from_settings(&settings.generation)?);
        let embedder = Arc::new(OpenAIEmbedder::from_settings(
            &settings.generation,
            &settings.embedding,
        )?);
        let transcripts = Arc::new(YtDlpTranscripts::new(settings.temp_dir()));

        Self::with_components(settings, prompts, generator, embedder, transcripts)
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        transcripts: Arc<dyn TranscriptFetcher>,
    ) -> Result<Self> {
        settings.validate()?;

        let chunker = TextChunker::new(ChunkingConfig::from(&settings.chunking))?;
        let extractor = Extractor::new(transcripts, settings.video.languages.clone());
        let index_builder = IndexBuilder::new(embedder.clone());
        let responder = Responder::new(generator.clone(), embedder, prompts.clone(), &settings.rag);
        let summarizer = Summarizer::new(generator.clone(), prompts.clone(), &settings.prompts.language);
        let quizzes = QuizGenerator::new(generator, prompts, &settings.prompts.language);

        Ok(Self {
            settings,
            extractor,
            chunker,
            index_builder,
            responder,
            summarizer,
            quizzes,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process a submission and make it the session's material.
    ///
    /// Everything is computed before the session is touched; on error the
    /// session is left as it was.
    #[instrument(skip(self, session, submission))]
    pub async fn ingest(&self, session: &mut StudySession, submission: Submission) -> Result<IngestReport> {
        let source = submission.into_source()?;
        info!("Processing {} source: {}", source.kind(), source.label());

        let text = self.extractor.extract(&source).await?;
        if text.trim().is_empty() {
            warn!("No text extracted from {}", source.label());
            return Err(StudyError::EmptySource);
        }

        let chunks = self.chunker.chunk(&text);
        let index = self
            .index_builder
            .build(chunks.clone())
            .await?
            .ok_or(StudyError::EmptySource)?;

        let summary = self.summarizer.summarize(&text).await;
        let document = SourceDocument::new(&source, text);

        let report = IngestReport {
            kind: document.kind,
            label: document.label.clone(),
            word_count: document.word_count,
            chunk_count: chunks.len(),
        };

        session.replace_material(Material {
            document,
            chunks,
            index,
            summary,
        });

        info!(
            "Ingested {} words in {} chunks",
            report.word_count, report.chunk_count
        );
        Ok(report)
    }

    /// Answer a chat message, streaming progress through `on_fragment`.
    ///
    /// Returns the assistant reply recorded in the transcript. Failures are
    /// reported inside the reply; only a blank message is rejected.
    #[instrument(skip(self, session, on_fragment))]
    pub async fn ask<F>(&self, session: &mut StudySession, message: &str, on_fragment: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let message = message.trim();
        if message.is_empty() {
            return Err(StudyError::InvalidInput("message is empty".to_string()));
        }

        let stream = self
            .responder
            .respond(message, session.index(), session.transcript())
            .await;

        let reply = match collect_answer(stream, on_fragment).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Answering failed: {}", e);
                format!("{} {}", ANSWER_FAILED_PREFIX, e)
            }
        };

        session.record_exchange(Turn::user(message), Turn::assistant(reply.clone()));
        Ok(reply)
    }

    /// Generate a fresh quiz about the session's material.
    ///
    /// Any previous quiz is discarded first, so a failure leaves no quiz.
    #[instrument(skip(self, session))]
    pub async fn generate_quiz(&self, session: &mut StudySession) -> Result<Quiz> {
        session.clear_quiz();

        let document = session
            .document()
            .ok_or_else(|| StudyError::NotReady(NO_MATERIAL_MESSAGE.to_string()))?;

        let count = question_count(document.word_count, &self.settings.quiz);
        info!("Generating {} questions from {} words", count, document.word_count);

        let quiz = self.quizzes.generate(&document.text, count).await?;
        session.set_quiz(quiz.clone());
        Ok(quiz)
    }

    /// Grade answers to the current quiz.
    pub fn submit_quiz(&self, session: &mut StudySession, answers: &[Option<String>]) -> Result<GradeReport> {
        let quiz = session
            .quiz()
            .ok_or_else(|| StudyError::NotReady("There is no quiz to submit. Generate one first.".to_string()))?;

        let report = quiz.grade(answers);
        info!("Quiz graded: {}/{} ({})", report.correct, report.total, report.score_display());
        session.set_grade(report.clone());
        Ok(report)
    }
}
