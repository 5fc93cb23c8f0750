//! CLI module for the study helper.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{Output, StreamingText};

use crate::source::{PdfUpload, Submission};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Study Helper - chat with, summarize and quiz yourself on PDFs and videos
#[derive(Parser, Debug)]
#[command(name = "study")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Material to study. PDFs take precedence over a video link.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// PDF file to study (repeat for several files)
    #[arg(long = "pdf", value_name = "FILE")]
    pub pdfs: Vec<PathBuf>,

    /// YouTube URL or video ID
    #[arg(long)]
    pub video: Option<String>,
}

impl SourceArgs {
    /// Read the PDFs from disk into a submission.
    pub fn into_submission(self) -> crate::error::Result<Submission> {
        let documents = self
            .pdfs
            .iter()
            .map(|path| PdfUpload::from_path(path))
            .collect::<crate::error::Result<Vec<_>>>()?;

        Ok(Submission {
            documents,
            video: self.video,
        })
    }

    /// Whether the video path will be used.
    pub fn uses_video(&self) -> bool {
        self.pdfs.is_empty()
            && self
                .video
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process material, show its summary and chat about it
    Chat {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Process material and print its summary
    Summarize {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Process material and take a multiple-choice quiz on it
    Quiz {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_with_pdfs() {
        let cli = Cli::parse_from(["study", "chat", "--pdf", "a.pdf", "--pdf", "b.pdf"]);
        match cli.command {
            Commands::Chat { source } => {
                assert_eq!(source.pdfs.len(), 2);
                assert!(!source.uses_video());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_quiz_with_video_and_verbosity() {
        let cli = Cli::parse_from(["study", "-vv", "quiz", "--video", "https://youtu.be/dQw4w9WgXcQ"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Quiz { source } => assert!(source.uses_video()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_empty_source_args_build_empty_submission() {
        let source = SourceArgs {
            pdfs: Vec::new(),
            video: None,
        };
        let submission = source.into_submission().unwrap();
        assert!(submission.into_source().is_err());
    }
}
