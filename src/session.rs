//! Per-user session state.
//!
//! The session is owned by the caller and mutated only through the
//! [`Pipeline`](crate::pipeline::Pipeline) handlers, one at a time.

use crate::chunking::Chunk;
use crate::index::Index;
use crate::quiz::{GradeReport, Quiz};
use crate::rag::Turn;
use crate::source::SourceDocument;
use uuid::Uuid;

/// Everything produced by one successful ingestion.
#[derive(Debug, Clone)]
pub struct Material {
    pub document: SourceDocument,
    pub chunks: Vec<Chunk>,
    pub index: Index,
    pub summary: String,
}

/// State of a single study session.
#[derive(Debug, Clone)]
pub struct StudySession {
    id: Uuid,
    material: Option<Material>,
    transcript: Vec<Turn>,
    quiz: Option<Quiz>,
    last_grade: Option<GradeReport>,
}

impl Default for StudySession {
    fn default() -> Self {
        Self::new()
    }
}

impl StudySession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            material: None,
            transcript: Vec::new(),
            quiz: None,
            last_grade: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether material has been processed and chat is available.
    pub fn is_active(&self) -> bool {
        self.material.is_some()
    }

    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    pub fn document(&self) -> Option<&SourceDocument> {
        self.material.as_ref().map(|m| &m.document)
    }

    pub fn index(&self) -> Option<&Index> {
        self.material.as_ref().map(|m| &m.index)
    }

    pub fn summary(&self) -> Option<&str> {
        self.material.as_ref().map(|m| m.summary.as_str())
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn last_grade(&self) -> Option<&GradeReport> {
        self.last_grade.as_ref()
    }

    /// Swap in new material. The transcript restarts with the summary as the
    /// first assistant turn and any previous quiz is discarded.
    pub fn replace_material(&mut self, material: Material) {
        self.transcript = vec![Turn::assistant(material.summary.clone())];
        self.quiz = None;
        self.last_grade = None;
        self.material = Some(material);
    }

    /// Record a question and its reply.
    pub fn record_exchange(&mut self, question: Turn, answer: Turn) {
        self.transcript.push(question);
        self.transcript.push(answer);
    }

    /// Drop the conversation but keep the material.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    pub fn set_quiz(&mut self, quiz: Quiz) {
        self.quiz = Some(quiz);
        self.last_grade = None;
    }

    pub fn clear_quiz(&mut self) {
        self.quiz = None;
        self.last_grade = None;
    }

    pub fn set_grade(&mut self, report: GradeReport) {
        self.last_grade = Some(report);
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self {
            id: self.id,
            ..Self::new()
        };
    }
}
