//! CLI command implementations.

mod chat;
mod config;
mod quiz;
mod serve;
mod summarize;

pub use chat::run_chat;
pub use config::run_config;
pub use quiz::run_quiz;
pub use serve::run_serve;
pub use summarize::run_summarize;

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SourceArgs};
use crate::pipeline::{IngestReport, Pipeline};
use crate::session::StudySession;
use anyhow::Result;

/// Check requirements, build the pipeline and process the material.
async fn prepare(
    source: SourceArgs,
    settings: crate::config::Settings,
) -> Result<(Pipeline, StudySession, IngestReport)> {
    let operation = Operation::Ingest {
        video: source.uses_video(),
    };
    if let Err(e) = preflight::check(operation, &settings.generation) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;
    let mut session = StudySession::new();
    let submission = source.into_submission()?;

    let spinner = Output::spinner("Processing material...");
    let result = pipeline.ingest(&mut session, submission).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Processed {} ({} words, {} chunks)",
        report.label, report.word_count, report.chunk_count
    ));

    Ok((pipeline, session, report))
}
