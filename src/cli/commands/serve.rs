//! HTTP API server for integration with other systems.
//!
//! Serves one study session; requests are handled one at a time.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::StudyError;
use crate::pipeline::Pipeline;
use crate::rag::Turn;
use crate::session::StudySession;
use crate::source::{PdfUpload, Submission};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Upload limit for the multipart ingest endpoint.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
    session: Mutex<StudySession>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings.generation) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;
    let app = router(pipeline);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Study Helper API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ingest", "POST /ingest (multipart: pdf, video)");
    Output::kv("Transcript", "GET  /transcript");
    Output::kv("Summary", "GET  /summary");
    Output::kv("Chat", "POST /chat");
    Output::kv("New quiz", "POST /quiz");
    Output::kv("Submit quiz", "POST /quiz/submit");
    Output::kv("Reset", "POST /reset");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(pipeline: Pipeline) -> Router {
    let state = Arc::new(AppState {
        pipeline,
        session: Mutex::new(StudySession::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/transcript", get(transcript))
        .route("/summary", get(summary))
        .route("/chat", post(chat))
        .route("/quiz", post(new_quiz))
        .route("/quiz/submit", post(submit_quiz))
        .route("/reset", post(reset))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct IngestResponse {
    kind: String,
    label: String,
    word_count: usize,
    chunk_count: usize,
    summary: String,
}

#[derive(Serialize)]
struct TranscriptResponse {
    active: bool,
    turns: Vec<Turn>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: Option<String>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Serialize)]
struct QuizResponse {
    questions: Vec<QuestionView>,
}

/// A question with its answer withheld.
#[derive(Serialize)]
struct QuestionView {
    question: String,
    options: Vec<String>,
}

#[derive(Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    answers: Vec<Option<String>>,
}

#[derive(Serialize)]
struct SubmitResponse {
    #[serde(flatten)]
    report: crate::quiz::GradeReport,
    score_display: String,
    passed: bool,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(err: StudyError) -> Response {
    let status = match &err {
        StudyError::InvalidInput(_) | StudyError::EmptySource | StudyError::Pdf(_) => {
            StatusCode::BAD_REQUEST
        }
        StudyError::NotReady(_) => StatusCode::CONFLICT,
        StudyError::MissingCredentials(_) | StudyError::ToolNotFound(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        StudyError::VideoSource(_)
        | StudyError::TranscriptUnavailable(_)
        | StudyError::Embedding(_)
        | StudyError::Generation(_)
        | StudyError::OpenAI(_)
        | StudyError::Schema(_)
        | StudyError::ToolFailed(_)
        | StudyError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ingest(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut submission = Submission::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StudyError::InvalidInput(e.body_text())),
        };

        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("pdf") => {
                let name = field.file_name().unwrap_or("upload.pdf").to_string();
                match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => {
                        submission.documents.push(PdfUpload::new(name, bytes.to_vec()));
                    }
                    Ok(_) => {}
                    Err(e) => return error_response(StudyError::InvalidInput(e.body_text())),
                }
            }
            Some("video") => match field.text().await {
                Ok(text) => submission.video = Some(text),
                Err(e) => return error_response(StudyError::InvalidInput(e.body_text())),
            },
            other => warn!("Ignoring unknown multipart field {:?}", other),
        }
    }

    let mut session = state.session.lock().await;
    match state.pipeline.ingest(&mut session, submission).await {
        Ok(report) => Json(IngestResponse {
            kind: report.kind.to_string(),
            label: report.label,
            word_count: report.word_count,
            chunk_count: report.chunk_count,
            summary: session.summary().unwrap_or_default().to_string(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn transcript(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(TranscriptResponse {
        active: session.is_active(),
        turns: session.transcript().to_vec(),
    })
}

async fn summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(SummaryResponse {
        summary: session.summary().map(str::to_string),
    })
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let mut session = state.session.lock().await;
    match state.pipeline.ask(&mut session, &req.message, |_| {}).await {
        Ok(answer) => Json(ChatResponse { answer }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn new_quiz(State(state): State<Arc<AppState>>) -> Response {
    let mut session = state.session.lock().await;
    match state.pipeline.generate_quiz(&mut session).await {
        Ok(quiz) => Json(QuizResponse {
            questions: quiz
                .items
                .into_iter()
                .map(|item| QuestionView {
                    question: item.question,
                    options: item.options,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> Response {
    let mut session = state.session.lock().await;
    let pass_score = state.pipeline.settings().quiz.pass_score;

    match state.pipeline.submit_quiz(&mut session, &req.answers) {
        Ok(report) => Json(SubmitResponse {
            score_display: report.score_display(),
            passed: report.passed(pass_score),
            message: report.verdict(pass_score).to_string(),
            report,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session.lock().await.reset();
    Json(serde_json::json!({ "status": "reset" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::embedding::Embedder;
    use crate::error::Result;
    use crate::generation::{ChatMessage, Generator, OutputSchema, TextStream};
    use crate::source::TranscriptFetcher;
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl Generator for Unused {
        async fn stream_chat(&self, _messages: Vec<ChatMessage>) -> Result<TextStream> {
            Err(StudyError::Generation("unused".to_string()))
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(StudyError::Generation("unused".to_string()))
        }

        async fn complete_structured(
            &self,
            _prompt: &str,
            _schema: &OutputSchema,
        ) -> Result<serde_json::Value> {
            Err(StudyError::Generation("unused".to_string()))
        }
    }

    #[async_trait]
    impl Embedder for Unused {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(StudyError::Embedding("unused".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(StudyError::Embedding("unused".to_string()))
        }

        fn dimensions(&self) -> usize {
            0
        }
    }

    #[async_trait]
    impl TranscriptFetcher for Unused {
        async fn fetch(&self, _video_id: &str, _language: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn state() -> Arc<AppState> {
        let pipeline = Pipeline::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(Unused),
            Arc::new(Unused),
            Arc::new(Unused),
        )
        .unwrap();

        Arc::new(AppState {
            pipeline,
            session: Mutex::new(StudySession::new()),
        })
    }

    #[tokio::test]
    async fn test_chat_before_ingest_is_inactive() {
        let state = state();
        let response = chat(
            State(state.clone()),
            Json(ChatRequest {
                message: "hello".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.session.lock().await.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_quiz_before_ingest_conflicts() {
        let response = new_quiz(State(state())).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_submit_without_quiz_conflicts() {
        let response = submit_quiz(State(state()), Json(SubmitRequest { answers: Vec::new() })).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(StudyError::EmptySource).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(StudyError::MissingCredentials("KEY".to_string())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_response(StudyError::Schema("bad".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
