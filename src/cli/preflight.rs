//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::GenerationSettings;
use crate::error::{Result, StudyError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Processing material; the video path needs yt-dlp.
    Ingest { video: bool },
    /// Serving the HTTP API.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, generation: &GenerationSettings) -> Result<()> {
    match operation {
        Operation::Ingest { video } => {
            check_api_key(generation)?;
            if video {
                check_tool("yt-dlp")?;
            }
        }
        Operation::Serve => {
            check_api_key(generation)?;
        }
    }
    Ok(())
}

/// Check that the configured API key variable is set.
fn check_api_key(generation: &GenerationSettings) -> Result<()> {
    if generation.api_key().is_some() {
        return Ok(());
    }
    Err(StudyError::Config(format!(
        "{0} not set. Set it with: export {0}='sk-...' or add it to a .env file",
        generation.api_key_env
    )))
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(StudyError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StudyError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(StudyError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
