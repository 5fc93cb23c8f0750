//! Study Helper - retrieval-augmented study assistant
//!
//! Turns PDFs or a YouTube video into a study session: the material is
//! summarized, can be discussed in a chat grounded in the source text, and
//! can be turned into a graded multiple-choice quiz.
//!
//! # Architecture
//!
//! - `source` - Text extraction from PDFs and video transcripts
//! - `chunking` - Line-aware text chunking with overlap
//! - `embedding` - Embedding generation
//! - `index` - In-memory similarity index
//! - `generation` - Generative model boundary (streamed, plain, structured)
//! - `rag` - Grounded, streamed answers
//! - `summary` - Material summaries
//! - `quiz` - Quiz generation and grading
//! - `session` - Per-user session state
//! - `pipeline` - Session handlers tying it all together
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use study_helper::config::Settings;
//! use study_helper::pipeline::Pipeline;
//! use study_helper::session::StudySession;
//! use study_helper::source::Submission;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::new(Settings::load()?)?;
//!     let mut session = StudySession::new();
//!
//!     let submission = Submission {
//!         documents: Vec::new(),
//!         video: Some("https://youtu.be/dQw4w9WgXcQ".to_string()),
//!     };
//!     pipeline.ingest(&mut session, submission).await?;
//!     println!("{}", session.summary().unwrap_or_default());
//!
//!     let answer = pipeline
//!         .ask(&mut session, "What is the main idea?", |_| {})
//!         .await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod openai;
pub mod pipeline;
pub mod quiz;
pub mod rag;
pub mod session;
pub mod source;
pub mod summary;

pub use error::{Result, StudyError};
