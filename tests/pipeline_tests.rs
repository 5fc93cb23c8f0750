//! End-to-end tests for the study pipeline against deterministic fakes.

use async_trait::async_trait;
use futures::stream;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use study_helper::config::{Prompts, Settings};
use study_helper::embedding::Embedder;
use study_helper::generation::{ChatMessage, Generator, OutputSchema, TextStream};
use study_helper::pipeline::{Pipeline, ANSWER_FAILED_PREFIX, NO_MATERIAL_MESSAGE};
use study_helper::rag::{Speaker, INACTIVE_MESSAGE};
use study_helper::session::StudySession;
use study_helper::source::{PdfUpload, Submission, TranscriptFetcher};
use study_helper::{Result, StudyError};

const VIDEO_ID: &str = "dQw4w9WgXcQ";
const VOCABULARY: [&str; 6] = ["photosynthesis", "chlorophyll", "light", "cell", "energy", "water"];

struct FakeEmbedder {
    batches: AtomicUsize,
}

impl FakeEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            batches: AtomicUsize::new(0),
        })
    }

    fn vector(text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| text.matches(word).count() as f32)
            .collect();
        vector.push(0.1);
        vector
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }
}

struct FakeGenerator {
    fragments: Vec<&'static str>,
    fail_mid_stream: bool,
    quiz_items: usize,
    completions: Mutex<Vec<String>>,
    structured: Mutex<Vec<String>>,
    chats: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeGenerator {
    fn new() -> Self {
        Self {
            fragments: vec!["Chlorophyll ", "absorbs ", "light."],
            fail_mid_stream: false,
            quiz_items: 3,
            completions: Mutex::new(Vec::new()),
            structured: Mutex::new(Vec::new()),
            chats: Mutex::new(Vec::new()),
        }
    }
}

fn quiz_item(n: usize) -> serde_json::Value {
    serde_json::json!({
        "question": format!("Question {}?", n),
        "options": [format!("right {}", n), "wrong a", "wrong b", "wrong c"],
        "correct_answer": format!("right {}", n)
    })
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TextStream> {
        self.chats.lock().unwrap().push(messages);

        let mut items: Vec<Result<String>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        if self.fail_mid_stream {
            items.push(Err(StudyError::OpenAI("stream interrupted".to_string())));
        }
        Ok(Box::pin(stream::iter(items)))
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.completions.lock().unwrap().push(prompt.to_string());
        Ok("## Overview\n\nA short summary of the material.".to_string())
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        _schema: &OutputSchema,
    ) -> Result<serde_json::Value> {
        self.structured.lock().unwrap().push(prompt.to_string());
        let items: Vec<_> = (0..self.quiz_items).map(quiz_item).collect();
        Ok(serde_json::json!({ "questions": items }))
    }
}

struct FakeTranscripts {
    by_video: HashMap<String, String>,
}

impl FakeTranscripts {
    fn with(video_id: &str, text: &str) -> Arc<Self> {
        let mut by_video = HashMap::new();
        by_video.insert(video_id.to_string(), text.to_string());
        Arc::new(Self { by_video })
    }
}

#[async_trait]
impl TranscriptFetcher for FakeTranscripts {
    async fn fetch(&self, video_id: &str, _language: &str) -> Result<Option<String>> {
        Ok(self.by_video.get(video_id).cloned())
    }
}

fn pipeline(
    generator: Arc<FakeGenerator>,
    embedder: Arc<FakeEmbedder>,
    transcripts: Arc<FakeTranscripts>,
) -> Pipeline {
    Pipeline::with_components(
        Settings::default(),
        Prompts::default(),
        generator,
        embedder,
        transcripts,
    )
    .unwrap()
}

fn video(link: &str) -> Submission {
    Submission {
        documents: Vec::new(),
        video: Some(link.to_string()),
    }
}

fn sample_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::from(page_id)],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

const LECTURE: &str = "Photosynthesis turns light into chemical energy.\n\
                       Chlorophyll absorbs light in the chloroplast.\n\
                       The cell also needs water and carbon dioxide.\n";

#[tokio::test]
async fn short_pdf_yields_one_chunk_and_three_question_quiz() {
    let generator = Arc::new(FakeGenerator::new());
    let embedder = FakeEmbedder::new();
    let pipeline = pipeline(generator.clone(), embedder.clone(), FakeTranscripts::with(VIDEO_ID, ""));
    let mut session = StudySession::new();

    let submission = Submission {
        documents: vec![PdfUpload::new("notes.pdf", sample_pdf("A. B. C."))],
        video: None,
    };
    let report = pipeline.ingest(&mut session, submission).await.unwrap();

    assert_eq!(report.chunk_count, 1);
    assert_eq!(session.index().map(|i| i.len()), Some(1));
    assert_eq!(generator.completions.lock().unwrap().len(), 1);
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.transcript()[0].role, Speaker::Assistant);
    assert_eq!(
        session.transcript()[0].content,
        "## Overview\n\nA short summary of the material."
    );

    let quiz = pipeline.generate_quiz(&mut session).await.unwrap();
    assert_eq!(quiz.len(), 3);
    let prompts = generator.structured.lock().unwrap();
    assert!(prompts[0].contains("exactly 3 questions"));
}

#[tokio::test]
async fn failed_video_leaves_previous_material_untouched() {
    let generator = Arc::new(FakeGenerator::new());
    let embedder = FakeEmbedder::new();
    let pipeline = pipeline(generator, embedder.clone(), FakeTranscripts::with(VIDEO_ID, LECTURE));
    let mut session = StudySession::new();

    pipeline.ingest(&mut session, video(VIDEO_ID)).await.unwrap();
    let label = session.document().map(|d| d.label.clone());
    let transcript = session.transcript().to_vec();
    let batches = embedder.batches.load(Ordering::SeqCst);

    let err = pipeline
        .ingest(&mut session, video("https://youtu.be/AAAAAAAAAAA"))
        .await
        .unwrap_err();

    assert!(matches!(err, StudyError::TranscriptUnavailable(_)));
    assert!(err.is_recoverable());
    assert_eq!(embedder.batches.load(Ordering::SeqCst), batches);
    assert_eq!(session.document().map(|d| d.label.clone()), label);
    assert_eq!(session.transcript(), transcript.as_slice());
}

#[tokio::test]
async fn asking_appends_exactly_two_turns() {
    let generator = Arc::new(FakeGenerator::new());
    let pipeline = pipeline(generator.clone(), FakeEmbedder::new(), FakeTranscripts::with(VIDEO_ID, LECTURE));
    let mut session = StudySession::new();
    pipeline.ingest(&mut session, video(VIDEO_ID)).await.unwrap();

    let before = session.transcript().len();
    let mut partials = Vec::new();
    let answer = pipeline
        .ask(&mut session, "What does chlorophyll do?", |p| partials.push(p.to_string()))
        .await
        .unwrap();

    assert_eq!(answer, "Chlorophyll absorbs light.");
    assert_eq!(
        partials,
        vec!["Chlorophyll ", "Chlorophyll absorbs ", "Chlorophyll absorbs light."]
    );
    assert_eq!(session.transcript().len(), before + 2);

    let turns = session.transcript();
    assert_eq!(turns[before].role, Speaker::User);
    assert_eq!(turns[before].content, "What does chlorophyll do?");
    assert_eq!(turns[before + 1].role, Speaker::Assistant);
    assert_eq!(turns[before + 1].content, answer);

    let chats = generator.chats.lock().unwrap();
    assert!(chats[0][0].content.contains("Chlorophyll absorbs light in the chloroplast."));
}

#[tokio::test]
async fn quiz_of_five_with_three_right_scores_sixty() {
    let mut generator = FakeGenerator::new();
    generator.quiz_items = 5;
    let generator = Arc::new(generator);

    let material = "study ".repeat(1000);
    let pipeline = pipeline(generator, FakeEmbedder::new(), FakeTranscripts::with(VIDEO_ID, &material));
    let mut session = StudySession::new();
    pipeline.ingest(&mut session, video(VIDEO_ID)).await.unwrap();

    let quiz = pipeline.generate_quiz(&mut session).await.unwrap();
    assert_eq!(quiz.len(), 5);

    let answers = vec![
        Some("right 0".to_string()),
        Some("right 1".to_string()),
        Some("right 2".to_string()),
        Some("wrong a".to_string()),
        None,
    ];
    let report = pipeline.submit_quiz(&mut session, &answers).unwrap();

    assert_eq!(report.correct, 3);
    assert_eq!(report.total, 5);
    assert_eq!(report.score_display(), "60.00");
    assert!(!report.passed(pipeline.settings().quiz.pass_score));
    assert_eq!(session.last_grade(), Some(&report));
}

#[tokio::test]
async fn asking_before_ingest_gets_inactive_message() {
    let generator = Arc::new(FakeGenerator::new());
    let pipeline = pipeline(generator.clone(), FakeEmbedder::new(), FakeTranscripts::with(VIDEO_ID, LECTURE));
    let mut session = StudySession::new();

    let answer = pipeline.ask(&mut session, "Hello?", |_| {}).await.unwrap();

    assert_eq!(answer, INACTIVE_MESSAGE);
    assert_eq!(session.transcript().len(), 2);
    assert!(generator.chats.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stream_failure_becomes_single_error_turn() {
    let mut generator = FakeGenerator::new();
    generator.fail_mid_stream = true;
    let pipeline = pipeline(Arc::new(generator), FakeEmbedder::new(), FakeTranscripts::with(VIDEO_ID, LECTURE));
    let mut session = StudySession::new();
    pipeline.ingest(&mut session, video(VIDEO_ID)).await.unwrap();

    let answer = pipeline.ask(&mut session, "Why?", |_| {}).await.unwrap();

    assert!(answer.starts_with(ANSWER_FAILED_PREFIX));
    assert!(answer.contains("stream interrupted"));
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn quiz_before_ingest_is_not_ready() {
    let pipeline = pipeline(
        Arc::new(FakeGenerator::new()),
        FakeEmbedder::new(),
        FakeTranscripts::with(VIDEO_ID, LECTURE),
    );
    let mut session = StudySession::new();

    let err = pipeline.generate_quiz(&mut session).await.unwrap_err();
    assert!(matches!(err, StudyError::NotReady(_)));
    assert_eq!(err.to_string(), NO_MATERIAL_MESSAGE);
    assert!(session.quiz().is_none());
}

#[tokio::test]
async fn blank_transcript_is_empty_source() {
    let pipeline = pipeline(
        Arc::new(FakeGenerator::new()),
        FakeEmbedder::new(),
        FakeTranscripts::with(VIDEO_ID, "  \n "),
    );
    let mut session = StudySession::new();

    let err = pipeline.ingest(&mut session, video(VIDEO_ID)).await.unwrap_err();
    assert!(matches!(err, StudyError::EmptySource));
    assert!(!session.is_active());
}

#[tokio::test]
async fn empty_submission_is_rejected() {
    let pipeline = pipeline(
        Arc::new(FakeGenerator::new()),
        FakeEmbedder::new(),
        FakeTranscripts::with(VIDEO_ID, LECTURE),
    );
    let mut session = StudySession::new();

    let err = pipeline.ingest(&mut session, Submission::default()).await.unwrap_err();
    assert!(matches!(err, StudyError::InvalidInput(_)));
    assert!(!session.is_active());
}

#[tokio::test]
async fn reingest_replaces_everything() {
    let generator = Arc::new(FakeGenerator::new());
    let pipeline = pipeline(generator, FakeEmbedder::new(), FakeTranscripts::with(VIDEO_ID, LECTURE));
    let mut session = StudySession::new();

    pipeline.ingest(&mut session, video(VIDEO_ID)).await.unwrap();
    pipeline.ask(&mut session, "What is light?", |_| {}).await.unwrap();
    pipeline.generate_quiz(&mut session).await.unwrap();
    assert_eq!(session.transcript().len(), 3);

    pipeline.ingest(&mut session, video(VIDEO_ID)).await.unwrap();
    assert_eq!(session.transcript().len(), 1);
    assert!(session.quiz().is_none());
}
