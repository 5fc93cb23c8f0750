//! Summarize command implementation.

use super::prepare;
use crate::cli::{Output, SourceArgs};
use crate::config::Settings;
use anyhow::Result;

/// Process material and print its summary.
pub async fn run_summarize(source: SourceArgs, settings: Settings) -> Result<()> {
    let (_pipeline, session, _report) = prepare(source, settings).await?;

    Output::header("Summary");
    println!("\n{}\n", session.summary().unwrap_or_default());

    Ok(())
}
