//! Text chunking for breaking extracted material into embeddable segments.
//!
//! Text is split on line breaks first, then pieces are accumulated greedily
//! up to the configured size. The tail of each chunk (whole lines, at most
//! `chunk_overlap` characters) is repeated at the head of the next one.

use crate::config::ChunkingSettings;
use crate::error::{Result, StudyError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A contiguous, possibly overlapping slice of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the source.
    pub index: usize,
    /// Text content of this chunk.
    pub content: String,
    /// Byte offset of the chunk in the source text.
    pub start: usize,
    /// Byte length of the leading region repeated from the previous chunk.
    pub overlap: usize,
}

impl Chunk {
    /// The part of the chunk not shared with the previous chunk.
    pub fn fresh(&self) -> &str {
        &self.content[self.overlap..]
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Byte offset just past the end of the chunk in the source text.
    pub fn end(&self) -> usize {
        self.start + self.content.len()
    }
}

/// Rebuild the source text from its chunks by dropping repeated overlaps.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::fresh).collect()
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Maximum number of characters carried into the next chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// The overlap must leave room for new text in every chunk.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(StudyError::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Line-aware splitter with character-based size limits.
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkingConfig,
}

/// A line (or a window of an over-long line) of the source text.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split text into chunks. Empty or whitespace-only text yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut current: Vec<Piece> = Vec::new();
        let mut current_chars = 0;
        let mut carried_bytes = 0;

        for piece in split_pieces(text, size) {
            if !current.is_empty() && current_chars + piece.chars > size {
                chunks.push(make_chunk(text, &current, chunks.len(), carried_bytes));

                let mut carried: Vec<Piece> = Vec::new();
                let mut carried_chars = 0;
                for p in current.iter().rev() {
                    if carried_chars + p.chars > overlap {
                        break;
                    }
                    carried_chars += p.chars;
                    carried.push(*p);
                }
                carried.reverse();

                while !carried.is_empty() && carried_chars + piece.chars > size {
                    let dropped = carried.remove(0);
                    carried_chars -= dropped.chars;
                }

                carried_bytes = match (carried.first(), carried.last()) {
                    (Some(first), Some(last)) => last.end - first.start,
                    _ => 0,
                };
                current = carried;
                current_chars = carried_chars;
            }

            current.push(piece);
            current_chars += piece.chars;
        }

        if !current.is_empty() {
            chunks.push(make_chunk(text, &current, chunks.len(), carried_bytes));
        }

        debug!(
            input_chars = text.chars().count(),
            chunk_count = chunks.len(),
            chunk_size = size,
            "Text chunked"
        );

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

/// Split text into line pieces (each keeping its `\n`), hard-splitting any
/// line longer than `size` characters.
fn split_pieces(text: &str, size: usize) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let chars = line.chars().count();
        if chars <= size {
            pieces.push(Piece {
                start: offset,
                end: offset + line.len(),
                chars,
            });
        } else {
            let mut window_start = offset;
            let mut count = 0;
            for (i, _) in line.char_indices() {
                if count == size {
                    pieces.push(Piece {
                        start: window_start,
                        end: offset + i,
                        chars: count,
                    });
                    window_start = offset + i;
                    count = 0;
                }
                count += 1;
            }
            pieces.push(Piece {
                start: window_start,
                end: offset + line.len(),
                chars: count,
            });
        }
        offset += line.len();
    }

    pieces
}

fn make_chunk(text: &str, pieces: &[Piece], index: usize, overlap: usize) -> Chunk {
    let start = pieces.first().map(|p| p.start).unwrap_or(0);
    let end = pieces.last().map(|p| p.end).unwrap_or(start);
    Chunk {
        index,
        content: text[start..end].to_string(),
        start,
        overlap,
    }
}
