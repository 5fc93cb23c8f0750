//! YouTube transcript source.
//!
//! Resolves video links to IDs and downloads subtitles (uploaded or
//! auto-generated) with yt-dlp, then flattens the WebVTT cues to plain text.

use super::TranscriptFetcher;
use crate::error::{Result, StudyError};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info, instrument};

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    // Matches various YouTube URL formats and bare video IDs
    Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("video id regex is valid")
});

static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("inline tag regex is valid"));

/// Extract a video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID.captures(input.trim())?;

    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Transcript fetcher backed by yt-dlp subtitle downloads.
pub struct YtDlpTranscripts {
    temp_dir: PathBuf,
}

impl YtDlpTranscripts {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    /// Locates a downloaded subtitle file.
    fn find_subtitle_file(dir: &Path) -> Result<Option<PathBuf>> {
        for entry in std::fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("vtt") {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl TranscriptFetcher for YtDlpTranscripts {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, language: &str) -> Result<Option<String>> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let workdir = tempfile::tempdir_in(&self.temp_dir)?;
        let template = workdir.path().join("%(id)s.%(ext)s");

        info!("Fetching {} transcript", language);

        let result = Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs").arg(language)
            .arg("--sub-format").arg("vtt")
            .arg("--output").arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(watch_url(video_id))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StudyError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(StudyError::ToolFailed(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StudyError::VideoSource(format!(
                "Video {} unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        let Some(path) = Self::find_subtitle_file(workdir.path())? else {
            debug!("No {} subtitles for {}", language, video_id);
            return Ok(None);
        };

        let vtt = std::fs::read_to_string(&path)?;
        let text = vtt_to_text(&vtt);
        Ok((!text.trim().is_empty()).then_some(text))
    }
}

/// Flatten WebVTT cues into plain text.
///
/// Drops headers, NOTE/STYLE blocks, cue settings and inline timing tags.
/// Auto-generated captions repeat the previous line as they roll, so a line
/// identical to the one before it is emitted once.
pub fn vtt_to_text(vtt: &str) -> String {
    let normalized = vtt.replace("\r\n", "\n");
    let mut lines: Vec<String> = Vec::new();

    for block in normalized.split("\n\n") {
        let block_lines: Vec<&str> = block.lines().collect();
        let Some(timing) = block_lines.iter().position(|l| l.contains("-->")) else {
            continue;
        };

        for raw in &block_lines[timing + 1..] {
            let cleaned = decode_entities(&INLINE_TAG.replace_all(raw, ""));
            let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
            if cleaned.is_empty() {
                continue;
            }
            if lines.last() == Some(&cleaned) {
                continue;
            }
            lines.push(cleaned);
        }
    }

    lines.join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
