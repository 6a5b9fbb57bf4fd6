//! Fixed-size sliding-window chunking over characters.

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Window geometry. Construction guarantees `0 <= overlap < chunk_size`,
/// so the window always advances by at least one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }
    pub fn overlap(&self) -> usize { self.overlap }

    fn step(&self) -> usize { self.chunk_size - self.overlap }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 100 }
    }
}

/// Split `text` into overlapping windows of at most `chunk_size` characters.
///
/// The next window starts `chunk_size - overlap` characters after the previous
/// one; the last window may be shorter and always ends at the end of the text.
/// A window that would lie entirely inside the previous one is never emitted,
/// so text no longer than `chunk_size` is a single chunk. Empty text yields no
/// chunks.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<&str>> {
    let config = ChunkingConfig::new(chunk_size, overlap)?;
    Ok(windows(text, &config).into_iter().map(|(_, s)| s).collect())
}

/// (character offset, slice) for every window of `text`.
fn windows<'a>(text: &'a str, config: &ChunkingConfig) -> Vec<(usize, &'a str)> {
    // byte offset of every char boundary, including the end of the string
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let len = bounds.len() - 1;

    let mut out = Vec::with_capacity(len / config.step() + 1);
    let mut start = 0;
    while start < len {
        let end = (start + config.chunk_size).min(len);
        out.push((start, &text[bounds[start]..bounds[end]]));
        if end >= len { break; }
        start += config.step();
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self { Self { config } }

    /// Chunk one document, carrying its source attribution onto every chunk.
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        windows(doc.text(), &self.config)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start_offset, text))| Chunk {
                source_tag: doc.source_tag().to_string(),
                doc_id: doc.id().to_string(),
                chunk_index,
                start_offset,
                text: text.to_string(),
            })
            .collect()
    }
}
